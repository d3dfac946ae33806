use std::sync::Arc;

use storage::http::HttpConfig;
use storage::repository::Storage;
use testcraft_core::model::TestId;

use crate::error::AppServicesError;
use crate::exam::ExamLoopService;
use crate::ranking_service::RankingService;
use crate::retry::RetryPolicy;
use crate::Clock;

/// Assembles app-facing services for one configured test.
#[derive(Clone)]
pub struct AppServices {
    test_id: TestId,
    preview: bool,
    exam_loop: Arc<ExamLoopService>,
    rankings: Arc<RankingService>,
}

impl AppServices {
    #[must_use]
    pub fn new(storage: &Storage, clock: Clock, test_id: TestId) -> Self {
        let exam_loop = Arc::new(ExamLoopService::new(
            clock,
            Arc::clone(&storage.tests),
            Arc::clone(&storage.access),
            Arc::clone(&storage.submissions),
            Arc::clone(&storage.code_runner),
        ));
        let rankings = Arc::new(RankingService::new(
            Arc::clone(&storage.results),
            Arc::clone(&storage.users),
        ));
        Self {
            test_id,
            preview: false,
            exam_loop,
            rankings,
        }
    }

    /// Build services backed by the REST backend.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the HTTP client cannot be built.
    pub fn new_http(
        config: HttpConfig,
        clock: Clock,
        test_id: TestId,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::http(config)?;
        Ok(Self::new(&storage, clock, test_id))
    }

    #[must_use]
    pub fn with_preview(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        let exam_loop = (*self.exam_loop).clone().with_retry_policy(retry);
        self.exam_loop = Arc::new(exam_loop);
        self
    }

    #[must_use]
    pub fn test_id(&self) -> TestId {
        self.test_id
    }

    #[must_use]
    pub fn preview(&self) -> bool {
        self.preview
    }

    #[must_use]
    pub fn exam_loop(&self) -> Arc<ExamLoopService> {
        Arc::clone(&self.exam_loop)
    }

    #[must_use]
    pub fn rankings(&self) -> Arc<RankingService> {
        Arc::clone(&self.rankings)
    }
}
