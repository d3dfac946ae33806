use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use storage::repository::AccessGrant;
use testcraft_core::model::{
    AnswerSnapshot, AnswerValue, Language, OptionId, Question, QuestionAnswer, QuestionId,
    QuestionKind, QuestionOption, RunOutcome, SectionId, SubmissionId, SubmitReason, TestCase,
    TestDefinition, UserId,
};
use tracing::info;

use super::answers::AnswerStore;
use super::navigator::Navigator;
use super::progress::{ExamProgress, PaletteItem, SectionProgress};
use super::start::StartRequest;
use super::timer::{CountdownTimer, TickOutcome};
use crate::error::{AnswerError, ExamError};

//
// ─── PHASES ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamPhase {
    /// Start screen is showing.
    Unauthenticated,
    Active,
    /// Author walkthrough: no timer, no submission.
    Preview,
    /// Terminal.
    Submitted,
}

/// Delivery state of the submitted snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    Pending,
    Delivered(SubmissionId),
    /// The backend already holds this snapshot.
    Duplicate,
    /// Transient failure; the same snapshot may be sent again.
    Failed(String),
    /// The backend refused the snapshot. Sending it again cannot help.
    Rejected(String),
}

impl DeliveryStatus {
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryStatus::Delivered(_) | DeliveryStatus::Duplicate)
    }

    /// No further delivery attempt will change this status.
    #[must_use]
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            DeliveryStatus::Delivered(_) | DeliveryStatus::Duplicate | DeliveryStatus::Rejected(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub user_id: UserId,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub snapshot: AnswerSnapshot,
    pub delivery: DeliveryStatus,
}

//
// ─── QUESTION VIEW ─────────────────────────────────────────────────────────────
//

/// What the question pane renders for the current question.
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionView {
    MultipleChoice {
        id: QuestionId,
        text: String,
        options: Vec<QuestionOption>,
        selected: Option<OptionId>,
        is_marked: bool,
    },
    Coding {
        id: QuestionId,
        text: String,
        code: String,
        language: Language,
        test_cases: Vec<TestCase>,
        last_run: Option<RunOutcome>,
        is_marked: bool,
    },
}

impl QuestionView {
    #[must_use]
    pub fn id(&self) -> QuestionId {
        match self {
            QuestionView::MultipleChoice { id, .. } | QuestionView::Coding { id, .. } => *id,
        }
    }

    #[must_use]
    pub fn is_marked(&self) -> bool {
        match self {
            QuestionView::MultipleChoice { is_marked, .. }
            | QuestionView::Coding { is_marked, .. } => *is_marked,
        }
    }
}

/// Editor content for a coding question: written code, else the question
/// template, else the language default.
#[must_use]
pub fn editor_code(question: &Question, answer: Option<&QuestionAnswer>) -> String {
    if let Some(code) = answer.and_then(|a| a.user_code.as_deref()) {
        return code.to_string();
    }
    match question.code_template() {
        Some(template) if !template.trim().is_empty() => template.to_string(),
        _ => answer
            .map(|a| a.language)
            .unwrap_or_default()
            .default_template()
            .to_string(),
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Timed test-taking state machine. Performs no I/O.
#[derive(Debug, Clone)]
pub struct ExamSession {
    definition: Arc<TestDefinition>,
    phase: ExamPhase,
    navigator: Navigator,
    answers: AnswerStore,
    timer: CountdownTimer,
    candidate: Option<Candidate>,
    started_at: Option<DateTime<Utc>>,
    sidebar_visible: bool,
    fullscreen: bool,
    runs: HashMap<QuestionId, RunOutcome>,
    submission: Option<Submission>,
}

impl ExamSession {
    #[must_use]
    pub fn new(definition: TestDefinition) -> Self {
        Self::with_definition(Arc::new(definition))
    }

    fn with_definition(definition: Arc<TestDefinition>) -> Self {
        Self {
            navigator: Navigator::new(&definition),
            answers: AnswerStore::new(&definition),
            definition,
            phase: ExamPhase::Unauthenticated,
            timer: CountdownTimer::new(),
            candidate: None,
            started_at: None,
            sidebar_visible: true,
            fullscreen: false,
            runs: HashMap::new(),
            submission: None,
        }
    }

    #[must_use]
    pub fn definition(&self) -> &TestDefinition {
        &self.definition
    }

    #[must_use]
    pub fn phase(&self) -> ExamPhase {
        self.phase
    }

    /// Navigation and answering are allowed.
    #[must_use]
    pub fn is_interactive(&self) -> bool {
        matches!(self.phase, ExamPhase::Active | ExamPhase::Preview)
    }

    #[must_use]
    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    #[must_use]
    pub fn timer(&self) -> &CountdownTimer {
        &self.timer
    }

    #[must_use]
    pub fn candidate(&self) -> Option<&Candidate> {
        self.candidate.as_ref()
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Countdown value for the header. Full duration before the timer starts.
    #[must_use]
    pub fn seconds_remaining(&self) -> u32 {
        match self.phase {
            ExamPhase::Active | ExamPhase::Submitted => self.timer.remaining(),
            ExamPhase::Unauthenticated | ExamPhase::Preview => self.definition.duration_seconds(),
        }
    }

    #[must_use]
    pub fn sidebar_visible(&self) -> bool {
        self.sidebar_visible
    }

    #[must_use]
    pub fn fullscreen(&self) -> bool {
        self.fullscreen
    }

    #[must_use]
    pub fn last_run(&self, id: QuestionId) -> Option<&RunOutcome> {
        self.runs.get(&id)
    }

    #[must_use]
    pub fn submission(&self) -> Option<&Submission> {
        self.submission.as_ref()
    }

    #[must_use]
    pub fn delivery_status(&self) -> Option<&DeliveryStatus> {
        self.submission.as_ref().map(|s| &s.delivery)
    }

    fn ensure_interactive(&self) -> Result<(), ExamError> {
        if self.is_interactive() {
            Ok(())
        } else {
            Err(ExamError::NotActive)
        }
    }

    // ─── Lifecycle ─────────────────────────────────────────────────────────────

    /// Checks that a validated start request can be applied to this session.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::AlreadyStarted` outside the start screen, or
    /// `ExamError::UnknownSection` for a starting section without questions.
    pub fn ensure_can_start(&self, request: &StartRequest) -> Result<(), ExamError> {
        if self.phase != ExamPhase::Unauthenticated {
            return Err(ExamError::AlreadyStarted);
        }
        if let Some(section) = request.starting_section() {
            if self.definition.questions_in(section).next().is_none() {
                return Err(ExamError::UnknownSection(section.to_string()));
            }
        }
        Ok(())
    }

    /// Enters `Active` after the access code was accepted and starts the timer.
    ///
    /// # Errors
    ///
    /// See [`ExamSession::ensure_can_start`].
    pub fn start(
        &mut self,
        request: &StartRequest,
        grant: &AccessGrant,
        now: DateTime<Utc>,
    ) -> Result<(), ExamError> {
        self.ensure_can_start(request)?;
        self.phase = ExamPhase::Active;
        self.candidate = Some(Candidate {
            user_id: grant.user_id.clone(),
            email: grant.email.clone(),
        });
        self.started_at = Some(now);
        self.timer.start(self.definition.duration_seconds());
        if let Some(section) = request.starting_section() {
            self.navigator.select_section(section);
        }
        info!(
            test_id = %self.definition.id(),
            user = %grant.user_id,
            "exam started"
        );
        Ok(())
    }

    /// Opens the test for an author without credentials or timer.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::AlreadyStarted` outside the start screen.
    pub fn start_preview(&mut self) -> Result<(), ExamError> {
        if self.phase != ExamPhase::Unauthenticated {
            return Err(ExamError::AlreadyStarted);
        }
        self.phase = ExamPhase::Preview;
        info!(test_id = %self.definition.id(), "preview opened");
        Ok(())
    }

    /// Returns to the start screen. Stops the timer and discards all answers.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NotActive` unless the session is active or in preview.
    pub fn logout(&mut self) -> Result<(), ExamError> {
        self.ensure_interactive()?;
        self.timer.stop();
        *self = Self::with_definition(Arc::clone(&self.definition));
        info!("logged out of exam");
        Ok(())
    }

    /// Advances the countdown by one second. On expiry the session is submitted
    /// with `SubmitReason::TimeExpired`.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        if self.phase != ExamPhase::Active {
            return TickOutcome::Idle;
        }
        let outcome = self.timer.tick();
        if outcome == TickOutcome::Expired {
            info!(test_id = %self.definition.id(), "time expired, submitting");
            self.finish(now, SubmitReason::TimeExpired);
        }
        outcome
    }

    /// Ends the test and produces the snapshot.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::PreviewMode` in preview and `ExamError::NotActive`
    /// in any other phase but `Active`.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<&AnswerSnapshot, ExamError> {
        match self.phase {
            ExamPhase::Active => {}
            ExamPhase::Preview => return Err(ExamError::PreviewMode),
            ExamPhase::Unauthenticated | ExamPhase::Submitted => {
                return Err(ExamError::NotActive);
            }
        }
        Ok(self.finish(now, SubmitReason::Manual))
    }

    fn finish(&mut self, now: DateTime<Utc>, reason: SubmitReason) -> &AnswerSnapshot {
        self.timer.stop();
        self.phase = ExamPhase::Submitted;
        let order: Vec<QuestionId> = self.definition.questions().iter().map(|q| q.id).collect();
        let snapshot = AnswerSnapshot {
            test_id: self.definition.id(),
            user_id: self
                .candidate
                .as_ref()
                .map_or_else(|| UserId::new(""), |c| c.user_id.clone()),
            submitted_at: now,
            elapsed_seconds: self.timer.elapsed(),
            reason,
            entries: self.answers.snapshot(&order),
        };
        info!(
            test_id = %snapshot.test_id,
            answered = snapshot.answered_count(),
            total = snapshot.entries.len(),
            ?reason,
            "exam submitted"
        );
        &self
            .submission
            .insert(Submission {
                snapshot,
                delivery: DeliveryStatus::Pending,
            })
            .snapshot
    }

    pub(crate) fn set_delivery(&mut self, status: DeliveryStatus) {
        if let Some(submission) = self.submission.as_mut() {
            submission.delivery = status;
        }
    }

    // ─── Navigation ────────────────────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns `ExamError::NotActive` outside `Active`/`Preview`.
    pub fn select_question(&mut self, index: usize) -> Result<bool, ExamError> {
        self.ensure_interactive()?;
        Ok(self.navigator.select_question(index))
    }

    /// # Errors
    ///
    /// Returns `ExamError::NotActive` outside `Active`/`Preview`.
    pub fn select_section(&mut self, section: &SectionId) -> Result<bool, ExamError> {
        self.ensure_interactive()?;
        Ok(self.navigator.select_section(section))
    }

    /// # Errors
    ///
    /// Returns `ExamError::NotActive` outside `Active`/`Preview`.
    pub fn next(&mut self) -> Result<bool, ExamError> {
        self.ensure_interactive()?;
        Ok(self.navigator.next())
    }

    /// # Errors
    ///
    /// Returns `ExamError::NotActive` outside `Active`/`Preview`.
    pub fn previous(&mut self) -> Result<bool, ExamError> {
        self.ensure_interactive()?;
        Ok(self.navigator.previous())
    }

    // ─── Answers ───────────────────────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns `ExamError::NotActive` outside `Active`/`Preview`, or an answer error.
    pub fn toggle_mark(&mut self, id: QuestionId) -> Result<bool, ExamError> {
        self.ensure_interactive()?;
        Ok(self.answers.toggle_mark(id)?)
    }

    /// # Errors
    ///
    /// Returns `ExamError::NotActive` outside `Active`/`Preview`, or an answer error.
    pub fn set_answer(&mut self, id: QuestionId, value: AnswerValue) -> Result<(), ExamError> {
        self.ensure_interactive()?;
        Ok(self.answers.set_answer(id, value)?)
    }

    /// # Errors
    ///
    /// Returns `ExamError::NotActive` outside `Active`/`Preview`, or an answer error.
    pub fn clear_answer(&mut self, id: QuestionId) -> Result<(), ExamError> {
        self.ensure_interactive()?;
        Ok(self.answers.clear_answer(id)?)
    }

    /// # Errors
    ///
    /// Returns `ExamError::NotActive` outside `Active`/`Preview`, or an answer error.
    pub fn set_language(&mut self, id: QuestionId, language: Language) -> Result<(), ExamError> {
        self.ensure_interactive()?;
        Ok(self.answers.set_language(id, language)?)
    }

    /// # Errors
    ///
    /// Returns `ExamError::NotActive` outside `Active`/`Preview`.
    pub fn record_run(&mut self, id: QuestionId, outcome: RunOutcome) -> Result<(), ExamError> {
        self.ensure_interactive()?;
        self.runs.insert(id, outcome);
        Ok(())
    }

    // ─── UI flags ──────────────────────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns `ExamError::NotActive` outside `Active`/`Preview`.
    pub fn toggle_sidebar(&mut self) -> Result<bool, ExamError> {
        self.ensure_interactive()?;
        self.sidebar_visible = !self.sidebar_visible;
        Ok(self.sidebar_visible)
    }

    /// # Errors
    ///
    /// Returns `ExamError::NotActive` outside `Active`/`Preview`.
    pub fn toggle_fullscreen(&mut self) -> Result<bool, ExamError> {
        self.ensure_interactive()?;
        self.fullscreen = !self.fullscreen;
        Ok(self.fullscreen)
    }

    // ─── Views ─────────────────────────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns `ExamError::NotActive` outside `Active`/`Preview`.
    pub fn view(&self) -> Result<QuestionView, ExamError> {
        self.ensure_interactive()?;
        self.question_view(self.navigator.current_question_id())
    }

    fn question_view(&self, id: QuestionId) -> Result<QuestionView, ExamError> {
        let question = self
            .definition
            .question(id)
            .ok_or(AnswerError::UnknownQuestion(id))?;
        let answer = self.answers.get(id);
        let is_marked = answer.is_some_and(|a| a.is_marked);
        let view = match &question.kind {
            QuestionKind::MultipleChoice { options } => QuestionView::MultipleChoice {
                id,
                text: question.text.clone(),
                options: options.clone(),
                selected: answer.and_then(|a| a.selected_option.clone()),
                is_marked,
            },
            QuestionKind::Coding { test_cases, .. } => QuestionView::Coding {
                id,
                text: question.text.clone(),
                code: editor_code(question, answer),
                language: answer.map(|a| a.language).unwrap_or_default(),
                test_cases: test_cases.clone(),
                last_run: self.runs.get(&id).cloned(),
                is_marked,
            },
        };
        Ok(view)
    }

    /// Counts per section in authored order.
    #[must_use]
    pub fn section_progress(&self) -> Vec<SectionProgress> {
        let current = self.navigator.current_section();
        self.definition
            .sections()
            .iter()
            .map(|section| {
                let mut progress = SectionProgress {
                    section: section.id.clone(),
                    title: section.title.clone(),
                    total: 0,
                    answered: 0,
                    marked: 0,
                    is_current: &section.id == current,
                };
                for question in self.definition.questions_in(&section.id) {
                    progress.total += 1;
                    if self.answers.is_answered(question.id) {
                        progress.answered += 1;
                    }
                    if self.answers.is_marked(question.id) {
                        progress.marked += 1;
                    }
                }
                progress
            })
            .collect()
    }

    /// Palette for the current section.
    #[must_use]
    pub fn palette(&self) -> Vec<PaletteItem> {
        let section = self.navigator.current_section();
        let current = self.navigator.current_index();
        self.navigator
            .indices_in(section)
            .enumerate()
            .filter_map(|(n, index)| {
                let question_id = self.navigator.question_at(index)?;
                let question = self.definition.question(question_id)?;
                Some(PaletteItem {
                    index,
                    number_in_section: n + 1,
                    question_id,
                    is_coding: question.is_coding(),
                    is_answered: self.answers.is_answered(question_id),
                    is_marked: self.answers.is_marked(question_id),
                    is_current: index == current,
                })
            })
            .collect()
    }

    #[must_use]
    pub fn progress(&self) -> ExamProgress {
        let questions = self.definition.questions();
        ExamProgress {
            total: questions.len(),
            answered: self.answers.answered_count(),
            marked: questions
                .iter()
                .filter(|q| self.answers.is_marked(q.id))
                .count(),
            current_index: self.navigator.current_index(),
        }
    }
}
