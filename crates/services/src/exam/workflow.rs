use std::sync::Arc;

use storage::repository::{
    AccessValidator, CodeRunner, StorageError, SubmissionRepository, TestRepository,
};
use testcraft_core::model::{QuestionId, QuestionKind, RunOutcome, TestId};
use tracing::{info, warn};

use super::controller::{editor_code, DeliveryStatus, ExamSession};
use super::start::StartForm;
use super::timer::TickOutcome;
use crate::error::{AnswerError, ExamError};
use crate::retry::{retry_async, RetryPolicy};
use crate::Clock;

/// Orchestrates an exam session against its collaborators.
#[derive(Clone)]
pub struct ExamLoopService {
    clock: Clock,
    tests: Arc<dyn TestRepository>,
    access: Arc<dyn AccessValidator>,
    submissions: Arc<dyn SubmissionRepository>,
    code_runner: Arc<dyn CodeRunner>,
    retry: RetryPolicy,
}

impl ExamLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        tests: Arc<dyn TestRepository>,
        access: Arc<dyn AccessValidator>,
        submissions: Arc<dyn SubmissionRepository>,
        code_runner: Arc<dyn CodeRunner>,
    ) -> Self {
        Self {
            clock,
            tests,
            access,
            submissions,
            code_runner,
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Fetch the definition and open a session on the start screen.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::Storage` if the definition cannot be loaded.
    pub async fn load(&self, test_id: TestId) -> Result<ExamSession, ExamError> {
        let definition = self.tests.load_test_definition(test_id).await.map_err(|e| {
            warn!(%test_id, error = %e, "failed to load test definition");
            e
        })?;
        info!(
            %test_id,
            questions = definition.questions().len(),
            sections = definition.sections().len(),
            "test definition loaded"
        );
        Ok(ExamSession::new(definition))
    }

    /// Validate the form locally, check the access code, then start the timer.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::Form` for local validation failures (no collaborator
    /// call is made), `ExamError::Access` when the code is rejected, and
    /// `ExamError::AlreadyStarted`/`ExamError::UnknownSection` from the session.
    /// The session stays on the start screen on every error.
    pub async fn start(&self, session: &mut ExamSession, form: &StartForm) -> Result<(), ExamError> {
        let request = form.validate()?;
        session.ensure_can_start(&request)?;
        let test_id = session.definition().id();
        let grant = self
            .access
            .validate_access_code(test_id, request.email(), request.access_code())
            .await
            .map_err(|e| {
                warn!(%test_id, error = %e, "access code rejected");
                e
            })?;
        session.start(&request, &grant, self.clock.now())
    }

    /// Submit manually and deliver the snapshot.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NotActive`/`ExamError::PreviewMode` from the session.
    /// Delivery failures are reported through the returned `DeliveryStatus`.
    pub async fn submit(&self, session: &mut ExamSession) -> Result<DeliveryStatus, ExamError> {
        session.submit(self.clock.now())?;
        self.deliver(session).await
    }

    /// Advance the countdown; on expiry the session is submitted and delivered once.
    ///
    /// # Errors
    ///
    /// Never fails for running or idle ticks; delivery errors are recorded on the session.
    pub async fn tick(&self, session: &mut ExamSession) -> Result<TickOutcome, ExamError> {
        let outcome = session.tick(self.clock.now());
        if outcome == TickOutcome::Expired {
            self.deliver(session).await?;
        }
        Ok(outcome)
    }

    /// Re-send the same snapshot after a failed delivery. Final statuses
    /// (delivered, duplicate, rejected) are returned as they are.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NothingToDeliver` if the session was never submitted.
    pub async fn retry_delivery(
        &self,
        session: &mut ExamSession,
    ) -> Result<DeliveryStatus, ExamError> {
        match session.delivery_status().cloned() {
            None => Err(ExamError::NothingToDeliver),
            Some(status) if status.is_final() => Ok(status),
            Some(_) => self.deliver(session).await,
        }
    }

    async fn deliver(&self, session: &mut ExamSession) -> Result<DeliveryStatus, ExamError> {
        let snapshot = session
            .submission()
            .map(|s| s.snapshot.clone())
            .ok_or(ExamError::NothingToDeliver)?;
        session.set_delivery(DeliveryStatus::Pending);
        let result = retry_async(&self.retry, StorageError::is_transient, || {
            self.submissions.submit_session(&snapshot)
        })
        .await;
        let status = match result {
            Ok(id) => {
                info!(test_id = %snapshot.test_id, submission = %id, "submission delivered");
                DeliveryStatus::Delivered(id)
            }
            Err(StorageError::Conflict) => {
                info!(test_id = %snapshot.test_id, "submission already received");
                DeliveryStatus::Duplicate
            }
            Err(e) if e.is_transient() => {
                warn!(test_id = %snapshot.test_id, error = %e, "submission delivery failed");
                DeliveryStatus::Failed(e.to_string())
            }
            Err(e) => {
                warn!(test_id = %snapshot.test_id, error = %e, "submission rejected");
                DeliveryStatus::Rejected(e.to_string())
            }
        };
        session.set_delivery(status.clone());
        Ok(status)
    }

    /// Send the current code of a coding question to the runner and keep the latest outcome.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NotActive` outside `Active`/`Preview`,
    /// `ExamError::Answer` for non-coding questions, and `ExamError::Storage`
    /// if the runner fails. Answers are untouched on error.
    pub async fn run_code(
        &self,
        session: &mut ExamSession,
        question_id: QuestionId,
    ) -> Result<RunOutcome, ExamError> {
        if !session.is_interactive() {
            return Err(ExamError::NotActive);
        }
        let definition = session.definition();
        let question = definition
            .question(question_id)
            .ok_or(AnswerError::UnknownQuestion(question_id))?;
        let QuestionKind::Coding { test_cases, .. } = &question.kind else {
            return Err(AnswerError::KindMismatch {
                question: question_id,
                expected: question.question_type(),
            }
            .into());
        };
        let test_cases = test_cases.clone();
        let answer = session.answers().get(question_id);
        let code = editor_code(question, answer);
        let language = answer.map(|a| a.language).unwrap_or_default();

        let outcome = self
            .code_runner
            .run_code(&code, language, &test_cases)
            .await
            .map_err(|e| {
                warn!(question = %question_id, error = %e, "code run failed");
                e
            })?;
        session.record_run(question_id, outcome.clone())?;
        Ok(outcome)
    }
}
