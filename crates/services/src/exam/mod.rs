mod answers;
mod controller;
mod navigator;
mod progress;
mod start;
mod timer;
mod workflow;

// Public API of the exam subsystem.
pub use crate::error::{AnswerError, ExamError, StartFormError};
pub use answers::AnswerStore;
pub use controller::{
    editor_code, Candidate, DeliveryStatus, ExamPhase, ExamSession, QuestionView, Submission,
};
pub use navigator::Navigator;
pub use progress::{ExamProgress, PaletteItem, SectionProgress};
pub use start::{StartForm, StartRequest};
pub use timer::{format_hms, CountdownTimer, TickOutcome};
pub use workflow::ExamLoopService;
