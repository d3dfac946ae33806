use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{OptionId, QuestionId, TestId, UserId};
use crate::model::language::Language;

/// Mutable per-question state held by the answer store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionAnswer {
    pub selected_option: Option<OptionId>,
    pub user_code: Option<String>,
    pub language: Language,
    pub is_marked: bool,
}

/// A value written from the question view back into the answer store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerValue {
    Option(OptionId),
    Code(String),
}

impl AnswerValue {
    #[must_use]
    pub fn option(id: impl Into<String>) -> Self {
        Self::Option(OptionId::new(id))
    }

    #[must_use]
    pub fn code(source: impl Into<String>) -> Self {
        Self::Code(source.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitReason {
    Manual,
    TimeExpired,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerEntry {
    pub question_id: QuestionId,
    pub selected_option: Option<OptionId>,
    pub user_code: Option<String>,
    pub language: Option<Language>,
    pub is_marked: bool,
}

/// Everything handed to the grading/storage collaborator on submission.
///
/// Contains one entry per question in authored order, answered or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSnapshot {
    pub test_id: TestId,
    pub user_id: UserId,
    pub submitted_at: DateTime<Utc>,
    pub elapsed_seconds: u32,
    pub reason: SubmitReason,
    pub entries: Vec<AnswerEntry>,
}

impl AnswerSnapshot {
    #[must_use]
    pub fn entry(&self, id: QuestionId) -> Option<&AnswerEntry> {
        self.entries.iter().find(|e| e.question_id == id)
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| {
                e.selected_option.is_some()
                    || e.user_code.as_deref().is_some_and(|c| !c.trim().is_empty())
            })
            .count()
    }
}
