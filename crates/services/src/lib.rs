#![forbid(unsafe_code)]

pub mod app_services;
pub mod authoring;
pub mod error;
pub mod exam;
pub mod ranking_service;
pub mod retry;

pub use storage::repository::{AccessError, StorageError};
pub use testcraft_core::Clock;

pub use app_services::AppServices;
pub use authoring::{AuthoringService, DraftStep, TestDraft};
pub use error::{
    AnswerError, AppServicesError, AuthoringError, ExamError, RankingError, StartFormError,
};
pub use exam::{DeliveryStatus, ExamLoopService, ExamPhase, ExamSession, StartForm, TickOutcome};
pub use ranking_service::RankingService;
pub use retry::RetryPolicy;
