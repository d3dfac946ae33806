use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;

use crate::model::ids::{OptionId, QuestionId, SectionId, TestId};
use crate::model::question::{Question, QuestionKind, Section};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DefinitionError {
    #[error("test title cannot be empty")]
    EmptyTitle,

    #[error("test duration must be > 0 seconds")]
    InvalidDuration,

    #[error("test needs at least one section and one question")]
    Empty,

    #[error("duplicate section id: {0}")]
    DuplicateSection(SectionId),

    #[error("duplicate question id: {0}")]
    DuplicateQuestion(QuestionId),

    #[error("question {question} references unknown section {section}")]
    UnknownSection {
        question: QuestionId,
        section: SectionId,
    },

    #[error("section {0} has no questions")]
    EmptySection(SectionId),

    #[error("multiple-choice question {0} has no options")]
    NoOptions(QuestionId),

    #[error("question {question} repeats option {option}")]
    DuplicateOption {
        question: QuestionId,
        option: OptionId,
    },
}

//
// ─── DEFINITION ────────────────────────────────────────────────────────────────
//

/// Authored structure of a test as delivered by the test-definition collaborator.
///
/// Questions keep their authored order; the navigator never re-sorts them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestDefinition {
    id: TestId,
    title: String,
    description: String,
    duration_seconds: u32,
    sections: Vec<Section>,
    questions: Vec<Question>,
}

impl TestDefinition {
    /// Builds a validated definition.
    ///
    /// # Errors
    ///
    /// Returns `DefinitionError` when the structure breaks a model invariant:
    /// empty title, zero duration, duplicate ids, a question pointing at an
    /// unknown section, a section without questions, or a multiple-choice
    /// question without (unique) options.
    pub fn new(
        id: TestId,
        title: impl Into<String>,
        description: impl Into<String>,
        duration_seconds: u32,
        sections: Vec<Section>,
        questions: Vec<Question>,
    ) -> Result<Self, DefinitionError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(DefinitionError::EmptyTitle);
        }
        if duration_seconds == 0 {
            return Err(DefinitionError::InvalidDuration);
        }
        if sections.is_empty() || questions.is_empty() {
            return Err(DefinitionError::Empty);
        }

        let mut section_ids = HashSet::with_capacity(sections.len());
        for section in &sections {
            if !section_ids.insert(&section.id) {
                return Err(DefinitionError::DuplicateSection(section.id.clone()));
            }
        }

        let mut question_ids = HashSet::with_capacity(questions.len());
        let mut used_sections = HashSet::with_capacity(sections.len());
        for question in &questions {
            if !question_ids.insert(question.id) {
                return Err(DefinitionError::DuplicateQuestion(question.id));
            }
            if !section_ids.contains(&question.section) {
                return Err(DefinitionError::UnknownSection {
                    question: question.id,
                    section: question.section.clone(),
                });
            }
            used_sections.insert(&question.section);
            question.validate_options()?;
        }

        if let Some(empty) = sections.iter().find(|s| !used_sections.contains(&s.id)) {
            return Err(DefinitionError::EmptySection(empty.id.clone()));
        }

        Ok(Self {
            id,
            title,
            description: description.into(),
            duration_seconds,
            sections,
            questions,
        })
    }

    #[must_use]
    pub fn id(&self) -> TestId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn duration_seconds(&self) -> u32 {
        self.duration_seconds
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    #[must_use]
    pub fn section(&self, id: &SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| &s.id == id)
    }

    /// Questions of one section in authored order.
    pub fn questions_in<'a>(&'a self, section: &'a SectionId) -> impl Iterator<Item = &'a Question> {
        self.questions.iter().filter(move |q| &q.section == section)
    }
}

impl Question {
    /// A multiple-choice question needs at least one option and unique option ids.
    ///
    /// # Errors
    ///
    /// Returns `DefinitionError::NoOptions` or `DefinitionError::DuplicateOption`.
    pub fn validate_options(&self) -> Result<(), DefinitionError> {
        let QuestionKind::MultipleChoice { options } = &self.kind else {
            return Ok(());
        };
        if options.is_empty() {
            return Err(DefinitionError::NoOptions(self.id));
        }
        let mut seen = HashSet::with_capacity(options.len());
        for option in options {
            if !seen.insert(&option.id) {
                return Err(DefinitionError::DuplicateOption {
                    question: self.id,
                    option: option.id.clone(),
                });
            }
        }
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
