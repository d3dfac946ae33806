use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use dioxus::core::NoOpMutations;
use dioxus::prelude::*;
use dioxus_router::{Routable, Router};
use services::{AppServices, Clock, ExamPhase, RetryPolicy};
use storage::repository::{InMemoryRepository, Storage};
use testcraft_core::model::{
    Question, QuestionId, QuestionOption, Section, SectionId, SubmissionId, TestCase,
    TestDefinition, TestId, TestResult, UserId, UserProfile,
};
use testcraft_core::time::fixed_now;

use crate::context::{CurrentUser, UiApp, build_app_context};
use crate::views::exam::ExamTestHandles;
use crate::views::{ExamView, RankingView};
use crate::vm::{ExamIntent, ExamVm};

pub const ACCESS_CODE: &str = "OPEN-SESAME";

pub fn test_id() -> TestId {
    TestId::new(1)
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Exam,
    Ranking,
}

#[derive(Props, Clone)]
struct ViewHarnessProps {
    app: Arc<AppServices>,
    view: ViewKind,
    exam_handles: ExamTestHandles,
    signed_in: Option<UserId>,
    user_slot: Rc<RefCell<Option<CurrentUser>>>,
}

impl PartialEq for ViewHarnessProps {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for ViewHarnessProps {}

#[component]
fn ViewRouterHarness(props: ViewHarnessProps) -> Element {
    let app: Arc<dyn UiApp> = props.app.clone();
    use_context_provider(|| build_app_context(&app));
    use_context_provider(|| props.view);
    use_context_provider(|| props.exam_handles.clone());
    let user = use_context_provider(|| CurrentUser(Signal::new(props.signed_in.clone())));
    *props.user_slot.borrow_mut() = Some(user);
    rsx! { Router::<TestRoute> {} }
}

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum TestRoute {
    #[route("/")]
    Root {},
}

#[component]
fn Root() -> Element {
    let view = use_context::<ViewKind>();
    match view {
        ViewKind::Exam => rsx! { ExamView {} },
        ViewKind::Ranking => rsx! { RankingView {} },
    }
}

pub fn definition() -> TestDefinition {
    TestDefinition::new(
        test_id(),
        "Full Stack Developer Assessment",
        "Covers the basics and one coding task.",
        5400,
        vec![
            Section::new(SectionId::new("general"), "General Knowledge", "Basic web concepts"),
            Section::new(SectionId::new("coding"), "Coding Challenges", "Practical problems"),
        ],
        vec![
            Question::multiple_choice(
                QuestionId::new(1),
                SectionId::new("general"),
                "What does **HTML** stand for?",
                vec![
                    QuestionOption::new("a", "Hyper Text Markup Language"),
                    QuestionOption::new("b", "High Tech Modern Language"),
                ],
            ),
            Question::multiple_choice(
                QuestionId::new(2),
                SectionId::new("general"),
                "Which tag makes a link?",
                vec![QuestionOption::new("a", "<a>"), QuestionOption::new("b", "<link>")],
            ),
            Question::coding(
                QuestionId::new(3),
                SectionId::new("coding"),
                "Reverse the input string.",
                "",
                vec![TestCase {
                    input: "hello".into(),
                    expected_output: "olleh".into(),
                }],
            ),
        ],
    )
    .expect("valid definition")
}

/// Repository with the assessment, two users and their results.
pub fn seeded_repo() -> InMemoryRepository {
    let repo = InMemoryRepository::new();
    repo.insert_test(definition(), ACCESS_CODE).expect("insert test");
    for (id, name, org) in [("u1", "Ada", Some("Acme")), ("u2", "Grace", None)] {
        repo.insert_user(UserProfile {
            user_id: UserId::new(id),
            name: name.into(),
            organization: org.map(str::to_string),
        })
        .expect("insert user");
    }
    for (user, score) in [("u1", 18), ("u2", 12)] {
        repo.insert_result(TestResult {
            id: SubmissionId::new_v4(),
            test_id: test_id(),
            user_id: UserId::new(user),
            score,
            max_score: 20,
            submitted_at: fixed_now(),
            completion_seconds: 1200,
        })
        .expect("insert result");
    }
    repo
}

pub struct ViewHarness {
    pub dom: VirtualDom,
    pub repo: InMemoryRepository,
    pub exam_handles: ExamTestHandles,
    user_slot: Rc<RefCell<Option<CurrentUser>>>,
}

impl ViewHarness {
    pub fn rebuild(&mut self) {
        self.dom.rebuild_in_place();
        drive_dom(&mut self.dom);
    }

    pub async fn drive_async(&mut self) {
        let _ = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            self.dom.wait_for_work(),
        )
        .await;
        self.dom.render_immediate(&mut NoOpMutations);
        self.dom.process_events();
    }

    /// Lets pending resources and spawned intents finish.
    pub async fn settle(&mut self) {
        for _ in 0..3 {
            self.drive_async().await;
        }
    }

    pub async fn dispatch(&mut self, intent: ExamIntent) {
        let dispatch = self.exam_handles.dispatch();
        self.dom.in_runtime(|| dispatch.call(intent));
        drive_dom(&mut self.dom);
        self.settle().await;
    }

    /// Takes the session out of its slot the way the countdown ticker does.
    pub fn check_out(&mut self) -> ExamVm {
        let mut vm = self.exam_handles.vm();
        let mut frozen = self.exam_handles.frozen();
        let taken = self.dom.in_runtime(|| {
            let taken = vm.write().take().expect("session in slot");
            frozen.set(Some(taken.clone()));
            taken
        });
        drive_dom(&mut self.dom);
        taken
    }

    pub fn hand_back(&mut self, session: ExamVm) {
        let mut vm = self.exam_handles.vm();
        let mut frozen = self.exam_handles.frozen();
        self.dom.in_runtime(|| {
            vm.set(Some(session));
            frozen.set(None);
        });
        drive_dom(&mut self.dom);
    }

    pub fn phase(&self) -> Option<ExamPhase> {
        let vm = self.exam_handles.vm();
        self.dom
            .in_runtime(|| vm.peek().as_ref().map(ExamVm::phase))
    }

    pub fn current_user(&self) -> Option<UserId> {
        let CurrentUser(user) = (*self.user_slot.borrow()).expect("current user provided");
        self.dom.in_runtime(|| user.peek().as_ref().cloned())
    }

    pub fn render(&self) -> String {
        dioxus_ssr::render(&self.dom)
    }
}

pub fn drive_dom(dom: &mut VirtualDom) {
    dom.process_events();
    dom.render_immediate(&mut NoOpMutations);
    dom.process_events();
}

pub async fn setup_view_harness(view: ViewKind) -> ViewHarness {
    setup_view_harness_with(view, seeded_repo(), false).await
}

pub async fn setup_view_harness_with(
    view: ViewKind,
    repo: InMemoryRepository,
    preview: bool,
) -> ViewHarness {
    let storage = Storage::from_in_memory(&repo);
    setup_with_storage(view, repo, &storage, preview).await
}

pub async fn setup_with_storage(
    view: ViewKind,
    repo: InMemoryRepository,
    storage: &Storage,
    preview: bool,
) -> ViewHarness {
    build_harness(view, repo, storage, preview, None).await
}

pub async fn setup_ranking_as(user: UserId) -> ViewHarness {
    let repo = seeded_repo();
    let storage = Storage::from_in_memory(&repo);
    build_harness(ViewKind::Ranking, repo, &storage, false, Some(user)).await
}

async fn build_harness(
    view: ViewKind,
    repo: InMemoryRepository,
    storage: &Storage,
    preview: bool,
    signed_in: Option<UserId>,
) -> ViewHarness {
    let app = AppServices::new(storage, Clock::fixed(fixed_now()), test_id())
        .with_preview(preview)
        .with_retry_policy(RetryPolicy::none());
    let exam_handles = ExamTestHandles::default();
    let user_slot = Rc::new(RefCell::new(None));

    let dom = VirtualDom::new_with_props(
        ViewRouterHarness,
        ViewHarnessProps {
            app: Arc::new(app),
            view,
            exam_handles: exam_handles.clone(),
            signed_in,
            user_slot: Rc::clone(&user_slot),
        },
    );

    let mut harness = ViewHarness {
        dom,
        repo,
        exam_handles,
        user_slot,
    };
    harness.rebuild();
    harness.settle().await;
    harness
}
