use std::sync::Arc;

use storage::repository::TestPublisher;
use testcraft_core::model::{
    DefinitionError, Question, QuestionId, QuestionKind, Section, SectionId, TestDefinition, TestId,
};
use tracing::{debug, info};

use crate::error::AuthoringError;

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Wizard step of a draft, in the order an author walks them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DraftStep {
    #[default]
    Details,
    Sections,
    Questions,
    Review,
}

impl DraftStep {
    fn next(self) -> Self {
        match self {
            DraftStep::Details => DraftStep::Sections,
            DraftStep::Sections => DraftStep::Questions,
            DraftStep::Questions | DraftStep::Review => DraftStep::Review,
        }
    }

    fn previous(self) -> Self {
        match self {
            DraftStep::Details | DraftStep::Sections => DraftStep::Details,
            DraftStep::Questions => DraftStep::Sections,
            DraftStep::Review => DraftStep::Questions,
        }
    }
}

/// A test under construction. Edits validate locally; [`TestDraft::build`]
/// applies the full `TestDefinition` invariants.
///
/// Question ids are handed out in order and never reused within a draft.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestDraft {
    step: DraftStep,
    title: String,
    description: String,
    duration_seconds: u32,
    sections: Vec<Section>,
    questions: Vec<Question>,
    last_question_id: u64,
}

impl TestDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn step(&self) -> DraftStep {
        self.step
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn questions_in<'a>(&'a self, section: &'a SectionId) -> impl Iterator<Item = &'a Question> {
        self.questions.iter().filter(move |q| &q.section == section)
    }

    pub fn set_details(
        &mut self,
        title: impl Into<String>,
        description: impl Into<String>,
        duration_seconds: u32,
    ) {
        let (title, description): (String, String) = (title.into(), description.into());
        self.title = title.trim().to_string();
        self.description = description.trim().to_string();
        self.duration_seconds = duration_seconds;
    }

    /// # Errors
    ///
    /// Returns `AuthoringError::Blank` for an empty id or title and
    /// `DefinitionError::DuplicateSection` if the id is taken.
    pub fn add_section(
        &mut self,
        id: &str,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<SectionId, AuthoringError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(AuthoringError::Blank("section id"));
        }
        let title = title.into();
        if title.trim().is_empty() {
            return Err(AuthoringError::Blank("section title"));
        }
        let id = SectionId::new(id);
        if self.sections.iter().any(|s| s.id == id) {
            return Err(DefinitionError::DuplicateSection(id).into());
        }
        let description: String = description.into();
        self.sections
            .push(Section::new(id.clone(), title.trim(), description.trim()));
        debug!(section = %id, "draft section added");
        Ok(id)
    }

    /// Removes a section together with its questions.
    ///
    /// # Errors
    ///
    /// Returns `AuthoringError::UnknownSection` if the draft has no such section.
    pub fn remove_section(&mut self, id: &SectionId) -> Result<Section, AuthoringError> {
        let index = self
            .sections
            .iter()
            .position(|s| &s.id == id)
            .ok_or_else(|| AuthoringError::UnknownSection(id.clone()))?;
        self.questions.retain(|q| &q.section != id);
        Ok(self.sections.remove(index))
    }

    /// Appends a question to `section` and returns its new id.
    ///
    /// # Errors
    ///
    /// Returns `AuthoringError::UnknownSection`, `AuthoringError::Blank` for
    /// empty question or option text, or the option errors of `DefinitionError`.
    pub fn add_question(
        &mut self,
        section: &SectionId,
        text: impl Into<String>,
        kind: QuestionKind,
    ) -> Result<QuestionId, AuthoringError> {
        if !self.sections.iter().any(|s| &s.id == section) {
            return Err(AuthoringError::UnknownSection(section.clone()));
        }
        let text = text.into();
        if text.trim().is_empty() {
            return Err(AuthoringError::Blank("question text"));
        }
        let blank_option = matches!(
            &kind,
            QuestionKind::MultipleChoice { options } if options.iter().any(|o| o.text.trim().is_empty())
        );
        if blank_option {
            return Err(AuthoringError::Blank("option text"));
        }

        let id = QuestionId::new(self.last_question_id + 1);
        let question = Question {
            id,
            text,
            section: section.clone(),
            kind,
        };
        question.validate_options()?;
        self.last_question_id += 1;
        self.questions.push(question);
        debug!(question = %id, section = %section, "draft question added");
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns `AuthoringError::UnknownQuestion` if the draft has no such question.
    pub fn remove_question(&mut self, id: QuestionId) -> Result<Question, AuthoringError> {
        let index = self
            .questions
            .iter()
            .position(|q| q.id == id)
            .ok_or(AuthoringError::UnknownQuestion(id))?;
        Ok(self.questions.remove(index))
    }

    /// What keeps the author on the current step, if anything.
    ///
    /// # Errors
    ///
    /// Details need a title, description and duration; sections need at least
    /// one entry; every section needs a question before review.
    pub fn check_step(&self) -> Result<(), AuthoringError> {
        match self.step {
            DraftStep::Details => {
                if self.title.is_empty() {
                    return Err(DefinitionError::EmptyTitle.into());
                }
                if self.description.is_empty() {
                    return Err(AuthoringError::Blank("test description"));
                }
                if self.duration_seconds == 0 {
                    return Err(DefinitionError::InvalidDuration.into());
                }
                Ok(())
            }
            DraftStep::Sections if self.sections.is_empty() => Err(DefinitionError::Empty.into()),
            DraftStep::Questions => match self
                .sections
                .iter()
                .find(|s| self.questions_in(&s.id).next().is_none())
            {
                Some(empty) => Err(DefinitionError::EmptySection(empty.id.clone()).into()),
                None => Ok(()),
            },
            DraftStep::Sections | DraftStep::Review => Ok(()),
        }
    }

    /// # Errors
    ///
    /// Returns the [`TestDraft::check_step`] error; the step is unchanged then.
    pub fn next_step(&mut self) -> Result<DraftStep, AuthoringError> {
        self.check_step()?;
        self.step = self.step.next();
        Ok(self.step)
    }

    pub fn previous_step(&mut self) -> DraftStep {
        self.step = self.step.previous();
        self.step
    }

    /// # Errors
    ///
    /// Returns `AuthoringError::Blank` for a missing description, or the
    /// `DefinitionError` the finished structure violates.
    pub fn build(&self, id: TestId) -> Result<TestDefinition, AuthoringError> {
        if self.description.is_empty() {
            return Err(AuthoringError::Blank("test description"));
        }
        Ok(TestDefinition::new(
            id,
            self.title.clone(),
            self.description.clone(),
            self.duration_seconds,
            self.sections.clone(),
            self.questions.clone(),
        )?)
    }
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Publishes reviewed drafts so candidates can unlock them with an access code.
#[derive(Clone)]
pub struct AuthoringService {
    publisher: Arc<dyn TestPublisher>,
}

impl AuthoringService {
    #[must_use]
    pub fn new(publisher: Arc<dyn TestPublisher>) -> Self {
        Self { publisher }
    }

    /// # Errors
    ///
    /// Returns `AuthoringError::NotReviewed` before the review step,
    /// `AuthoringError::Blank` without an access code, the `build` errors, or
    /// `AuthoringError::Storage` if the publisher refuses the test.
    pub async fn publish(
        &self,
        draft: &TestDraft,
        id: TestId,
        access_code: &str,
    ) -> Result<TestDefinition, AuthoringError> {
        if draft.step() != DraftStep::Review {
            return Err(AuthoringError::NotReviewed);
        }
        if access_code.trim().is_empty() {
            return Err(AuthoringError::Blank("access code"));
        }
        let definition = draft.build(id)?;
        self.publisher.publish_test(&definition, access_code).await?;
        info!(
            test_id = %id,
            sections = definition.sections().len(),
            questions = definition.questions().len(),
            "test published"
        );
        Ok(definition)
    }
}
