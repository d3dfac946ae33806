use std::sync::Arc;

use dioxus::prelude::*;
use services::{AppServices, ExamLoopService, RankingService};
use testcraft_core::model::{TestId, UserId};

pub trait UiApp: Send + Sync {
    fn test_id(&self) -> TestId;
    fn preview(&self) -> bool;

    fn exam_loop(&self) -> Arc<ExamLoopService>;
    fn rankings(&self) -> Arc<RankingService>;
}

impl UiApp for AppServices {
    fn test_id(&self) -> TestId {
        AppServices::test_id(self)
    }

    fn preview(&self) -> bool {
        AppServices::preview(self)
    }

    fn exam_loop(&self) -> Arc<ExamLoopService> {
        AppServices::exam_loop(self)
    }

    fn rankings(&self) -> Arc<RankingService> {
        AppServices::rankings(self)
    }
}

#[derive(Clone)]
pub struct AppContext {
    test_id: TestId,
    preview: bool,

    exam_loop: Arc<ExamLoopService>,
    rankings: Arc<RankingService>,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            test_id: app.test_id(),
            preview: app.preview(),
            exam_loop: app.exam_loop(),
            rankings: app.rankings(),
        }
    }

    #[must_use]
    pub fn test_id(&self) -> TestId {
        self.test_id
    }

    /// Author preview: no credentials, no timer, no submission.
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

/// Candidate signed in on the exam screen. Provided by `App`; the ranking
/// page highlights this user.
#[derive(Clone, Copy, PartialEq)]
pub struct CurrentUser(pub Signal<Option<UserId>>);

// Provided by the composition root in `crates/app`.

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}
