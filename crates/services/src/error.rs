//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::{AccessError, StorageError};
use testcraft_core::model::{DefinitionError, OptionId, QuestionId, QuestionType, SectionId};

/// Errors emitted by the answer store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AnswerError {
    #[error("question {0} is not part of this test")]
    UnknownQuestion(QuestionId),
    #[error("question {question} expects a {expected:?} answer")]
    KindMismatch {
        question: QuestionId,
        expected: QuestionType,
    },
    #[error("option {option} does not belong to question {question}")]
    UnknownOption {
        question: QuestionId,
        option: OptionId,
    },
}

/// Local validation failures on the start screen. Never sent to a collaborator.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StartFormError {
    #[error("Please enter both email and access code")]
    Missing,
    #[error("Please enter a valid email address")]
    InvalidEmail,
}

/// Errors emitted by the exam session controller and workflow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExamError {
    #[error("the test is not in progress")]
    NotActive,
    #[error("the test has already started")]
    AlreadyStarted,
    #[error("preview sessions cannot be submitted")]
    PreviewMode,
    #[error("no submission is waiting for delivery")]
    NothingToDeliver,
    #[error("starting section {0} is not part of this test")]
    UnknownSection(String),
    #[error(transparent)]
    Form(#[from] StartFormError),
    #[error(transparent)]
    Answer(#[from] AnswerError),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `RankingService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RankingError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while a test is authored or published.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthoringError {
    #[error("{0} cannot be empty")]
    Blank(&'static str),
    #[error("section {0} is not part of this draft")]
    UnknownSection(SectionId),
    #[error("question {0} is not part of this draft")]
    UnknownQuestion(QuestionId),
    #[error("review the test before publishing it")]
    NotReviewed,
    #[error(transparent)]
    Definition(#[from] DefinitionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}
