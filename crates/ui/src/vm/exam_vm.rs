use services::exam::{ExamProgress, PaletteItem, QuestionView, SectionProgress, format_hms};
use services::{
    AccessError, DeliveryStatus, ExamError, ExamLoopService, ExamPhase, ExamSession, StartForm,
    StorageError, TickOutcome,
};
use testcraft_core::model::{AnswerValue, Language, OptionId, QuestionId, SectionId, TestId};
use tracing::debug;

use crate::views::ViewError;

#[derive(Clone, Debug, PartialEq)]
pub enum ExamIntent {
    SelectQuestion(usize),
    SelectSection(SectionId),
    Next,
    Previous,
    ToggleMark(QuestionId),
    SelectOption(QuestionId, OptionId),
    ClearAnswer(QuestionId),
    EditCode(QuestionId, String),
    SetLanguage(QuestionId, Language),
    ToggleSidebar,
    ToggleFullscreen,
    Logout,
    Start(StartForm),
    RunCode(QuestionId),
    Submit,
    RetryDelivery,
}

impl ExamIntent {
    /// Intents that reach a collaborator and must run outside the render pass.
    #[must_use]
    pub fn is_async(&self) -> bool {
        matches!(
            self,
            ExamIntent::Start(_)
                | ExamIntent::RunCode(_)
                | ExamIntent::Submit
                | ExamIntent::RetryDelivery
        )
    }
}

#[must_use]
pub fn view_error(err: &ExamError) -> ViewError {
    match err {
        ExamError::Form(form) => ViewError::Invalid(form.to_string()),
        ExamError::UnknownSection(_) => ViewError::Invalid(err.to_string()),
        ExamError::Answer(answer) => ViewError::Invalid(answer.to_string()),
        ExamError::PreviewMode => ViewError::Invalid("Preview sessions cannot be submitted.".into()),
        ExamError::Access(AccessError::Denied(_)) => ViewError::AccessDenied,
        ExamError::Storage(StorageError::NotFound) => ViewError::NotFound,
        ExamError::Access(AccessError::Storage(_)) | ExamError::Storage(_) => ViewError::Unavailable,
        _ => ViewError::Unknown,
    }
}

#[derive(Clone)]
pub struct ExamVm {
    session: ExamSession,
}

impl ExamVm {
    #[must_use]
    pub fn new(session: ExamSession) -> Self {
        Self { session }
    }

    #[must_use]
    pub fn session(&self) -> &ExamSession {
        &self.session
    }

    #[must_use]
    pub fn phase(&self) -> ExamPhase {
        self.session.phase()
    }

    #[must_use]
    pub fn title(&self) -> &str {
        self.session.definition().title()
    }

    #[must_use]
    pub fn is_preview(&self) -> bool {
        self.phase() == ExamPhase::Preview
    }

    #[must_use]
    pub fn candidate_email(&self) -> Option<&str> {
        self.session.candidate().map(|c| c.email.as_str())
    }

    #[must_use]
    pub fn timer_label(&self) -> String {
        format_hms(self.session.seconds_remaining())
    }

    /// The last five minutes are highlighted in the header.
    #[must_use]
    pub fn timer_warning(&self) -> bool {
        self.phase() == ExamPhase::Active && self.session.seconds_remaining() <= 300
    }

    #[must_use]
    pub fn sidebar_visible(&self) -> bool {
        self.session.sidebar_visible()
    }

    #[must_use]
    pub fn fullscreen(&self) -> bool {
        self.session.fullscreen()
    }

    #[must_use]
    pub fn question(&self) -> Option<QuestionView> {
        self.session.view().ok()
    }

    #[must_use]
    pub fn sections(&self) -> Vec<SectionProgress> {
        self.session.section_progress()
    }

    #[must_use]
    pub fn palette(&self) -> Vec<PaletteItem> {
        self.session.palette()
    }

    #[must_use]
    pub fn progress(&self) -> ExamProgress {
        self.session.progress()
    }

    #[must_use]
    pub fn can_previous(&self) -> bool {
        self.session.navigator().can_previous()
    }

    #[must_use]
    pub fn can_next(&self) -> bool {
        self.session.navigator().can_next()
    }

    #[must_use]
    pub fn position_label(&self) -> String {
        let (position, total) = self.session.navigator().position_in_section();
        format!("Question {position} of {total}")
    }

    #[must_use]
    pub fn delivery(&self) -> Option<&DeliveryStatus> {
        self.session.delivery_status()
    }

    /// Applies an intent that needs no collaborator.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::Invalid` for rejected answers and `ViewError::Unknown`
    /// for async intents or operations outside an active session.
    pub fn apply(&mut self, intent: &ExamIntent) -> Result<(), ViewError> {
        let session = &mut self.session;
        let result = match intent {
            ExamIntent::SelectQuestion(index) => session.select_question(*index).map(drop),
            ExamIntent::SelectSection(section) => session.select_section(section).map(drop),
            ExamIntent::Next => session.next().map(drop),
            ExamIntent::Previous => session.previous().map(drop),
            ExamIntent::ToggleMark(id) => session.toggle_mark(*id).map(drop),
            ExamIntent::SelectOption(id, option) => {
                session.set_answer(*id, AnswerValue::Option(option.clone()))
            }
            ExamIntent::ClearAnswer(id) => session.clear_answer(*id),
            ExamIntent::EditCode(id, code) => session.set_answer(*id, AnswerValue::code(code.clone())),
            ExamIntent::SetLanguage(id, language) => session.set_language(*id, *language),
            ExamIntent::ToggleSidebar => session.toggle_sidebar().map(drop),
            ExamIntent::ToggleFullscreen => session.toggle_fullscreen().map(drop),
            ExamIntent::Logout => session.logout(),
            ExamIntent::Start(_)
            | ExamIntent::RunCode(_)
            | ExamIntent::Submit
            | ExamIntent::RetryDelivery => return Err(ViewError::Unknown),
        };
        result.map_err(|err| view_error(&err))
    }

    /// Runs any intent, awaiting the collaborator when one is involved.
    ///
    /// # Errors
    ///
    /// Returns the `ViewError` matching the service failure. Delivery failures
    /// are not errors: they show up in [`ExamVm::delivery`].
    pub async fn perform(
        &mut self,
        exam_loop: &ExamLoopService,
        intent: ExamIntent,
    ) -> Result<(), ViewError> {
        let result = match intent {
            ExamIntent::Start(form) => exam_loop.start(&mut self.session, &form).await,
            ExamIntent::RunCode(id) => exam_loop.run_code(&mut self.session, id).await.map(drop),
            ExamIntent::Submit => exam_loop.submit(&mut self.session).await.map(drop),
            ExamIntent::RetryDelivery => exam_loop.retry_delivery(&mut self.session).await.map(drop),
            other => return self.apply(&other),
        };
        result.map_err(|err| view_error(&err))
    }

    /// Feeds `ticks` one-second ticks to the countdown; ticks owed while the
    /// session was busy are caught up here.
    pub async fn tick(&mut self, exam_loop: &ExamLoopService, ticks: u32) -> TickOutcome {
        let mut last = TickOutcome::Idle;
        for _ in 0..ticks {
            last = match exam_loop.tick(&mut self.session).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    debug!(error = %err, "tick failed");
                    TickOutcome::Idle
                }
            };
            if !matches!(last, TickOutcome::Running { .. }) {
                break;
            }
        }
        last
    }
}

/// # Errors
///
/// Returns `ViewError::NotFound` for an unknown test and
/// `ViewError::Unavailable` when the definition cannot be fetched.
pub async fn load_exam(
    exam_loop: &ExamLoopService,
    test_id: TestId,
    preview: bool,
) -> Result<ExamVm, ViewError> {
    let mut session = exam_loop
        .load(test_id)
        .await
        .map_err(|err| view_error(&err))?;
    if preview {
        session.start_preview().map_err(|err| view_error(&err))?;
    }
    Ok(ExamVm::new(session))
}
