use std::sync::Arc;

use async_trait::async_trait;
use services::{ExamPhase, StartForm};
use storage::repository::{ResultRepository, Storage, StorageError};
use testcraft_core::model::{OptionId, QuestionId, RunOutcome, SectionId, TestResult, UserId};

use super::test_harness::{
    ACCESS_CODE, ViewKind, seeded_repo, setup_ranking_as, setup_view_harness,
    setup_view_harness_with, setup_with_storage,
};
use crate::vm::ExamIntent;
use storage::repository::InMemoryRepository;

fn credentials() -> StartForm {
    StartForm::new("ada@example.com", ACCESS_CODE)
}

#[tokio::test(flavor = "current_thread")]
async fn start_screen_smoke_renders_test_information() {
    let harness = setup_view_harness(ViewKind::Exam).await;
    let html = harness.render();
    assert!(html.contains("Full Stack Developer Assessment"), "{html}");
    assert!(html.contains("1 hours 30 minutes"), "{html}");
    assert!(html.contains("General Knowledge - Basic web concepts"), "{html}");
    assert!(html.contains("Continue"), "{html}");
    assert_eq!(harness.phase(), Some(ExamPhase::Unauthenticated));
}

#[tokio::test(flavor = "current_thread")]
async fn start_intent_with_bad_email_stays_on_start_screen() {
    let mut harness = setup_view_harness(ViewKind::Exam).await;
    harness
        .dispatch(ExamIntent::Start(StartForm::new("not-an-email", ACCESS_CODE)))
        .await;

    let html = harness.render();
    assert!(html.contains("Please enter a valid email address"), "{html}");
    assert_eq!(harness.phase(), Some(ExamPhase::Unauthenticated));
}

#[tokio::test(flavor = "current_thread")]
async fn wrong_access_code_shows_denied_message() {
    let mut harness = setup_view_harness(ViewKind::Exam).await;
    harness
        .dispatch(ExamIntent::Start(StartForm::new("ada@example.com", "nope")))
        .await;

    let html = harness.render();
    assert!(html.contains("Invalid email or access code"), "{html}");
    assert_eq!(harness.phase(), Some(ExamPhase::Unauthenticated));
}

#[tokio::test(flavor = "current_thread")]
async fn start_intent_opens_exam_window() {
    let mut harness = setup_view_harness(ViewKind::Exam).await;
    harness.dispatch(ExamIntent::Start(credentials())).await;

    assert_eq!(harness.phase(), Some(ExamPhase::Active));
    let html = harness.render();
    assert!(html.contains("exam-window"), "{html}");
    assert!(html.contains("ada@example.com"), "{html}");
    assert!(html.contains("01:30:00"), "{html}");
    assert!(html.contains("<strong>HTML</strong>"), "{html}");
    assert!(html.contains("Mark for Review"), "{html}");
    assert!(html.contains("Answered 0 of 3"), "{html}");
}

#[tokio::test(flavor = "current_thread")]
async fn starting_section_picks_first_coding_question() {
    let mut harness = setup_view_harness(ViewKind::Exam).await;
    let form = credentials().with_starting_section(SectionId::new("coding"));
    harness.dispatch(ExamIntent::Start(form)).await;

    let html = harness.render();
    assert!(html.contains("Reverse the input string."), "{html}");
    assert!(html.contains("Run Code"), "{html}");
    assert!(html.contains("Run your code to see the output here."), "{html}");
}

#[tokio::test(flavor = "current_thread")]
async fn answering_and_marking_update_palette_and_footer() {
    let mut harness = setup_view_harness(ViewKind::Exam).await;
    harness.dispatch(ExamIntent::Start(credentials())).await;

    harness
        .dispatch(ExamIntent::SelectOption(QuestionId::new(1), OptionId::new("a")))
        .await;
    harness.dispatch(ExamIntent::ToggleMark(QuestionId::new(1))).await;

    let html = harness.render();
    assert!(html.contains("option option--selected"), "{html}");
    assert!(html.contains("palette-btn--answered"), "{html}");
    assert!(html.contains("Marked"), "{html}");
    assert!(html.contains("Answered 1 of 3 · Marked 1"), "{html}");

    harness.dispatch(ExamIntent::Next).await;
    let html = harness.render();
    assert!(html.contains("Which tag makes a link?"), "{html}");
}

#[tokio::test(flavor = "current_thread")]
async fn clear_response_unselects_the_option() {
    let mut harness = setup_view_harness(ViewKind::Exam).await;
    harness.dispatch(ExamIntent::Start(credentials())).await;
    assert!(!harness.render().contains("question-clear"));

    harness
        .dispatch(ExamIntent::SelectOption(QuestionId::new(1), OptionId::new("b")))
        .await;
    let html = harness.render();
    assert!(html.contains("Clear response"), "{html}");

    harness.dispatch(ExamIntent::ClearAnswer(QuestionId::new(1))).await;
    let html = harness.render();
    assert!(!html.contains("option option--selected"), "{html}");
    assert!(!html.contains("question-clear"), "{html}");
    assert!(html.contains("Answered 0 of 3"), "{html}");
}

#[tokio::test(flavor = "current_thread")]
async fn clicks_while_ticker_holds_the_session_are_ignored() {
    let mut harness = setup_view_harness(ViewKind::Exam).await;
    harness.dispatch(ExamIntent::Start(credentials())).await;

    let session = harness.check_out();
    harness
        .dispatch(ExamIntent::SelectOption(QuestionId::new(1), OptionId::new("a")))
        .await;
    harness.dispatch(ExamIntent::Submit).await;
    let html = harness.render();
    assert!(html.contains("exam-window"), "{html}");
    assert!(!html.contains("Something went wrong"), "{html}");

    harness.hand_back(session);
    assert_eq!(harness.phase(), Some(ExamPhase::Active));
    let html = harness.render();
    assert!(html.contains("Answered 0 of 3"), "{html}");
    assert!(harness.repo.submissions().expect("submissions").is_empty());

    harness
        .dispatch(ExamIntent::SelectOption(QuestionId::new(1), OptionId::new("a")))
        .await;
    assert!(harness.render().contains("Answered 1 of 3"));
}

#[tokio::test(flavor = "current_thread")]
async fn run_code_shows_collaborator_output() {
    let mut harness = setup_view_harness(ViewKind::Exam).await;
    harness
        .repo
        .set_run_outcome(RunOutcome {
            passed: true,
            output: "olleh".into(),
        })
        .expect("script run outcome");
    let form = credentials().with_starting_section(SectionId::new("coding"));
    harness.dispatch(ExamIntent::Start(form)).await;
    harness
        .dispatch(ExamIntent::EditCode(QuestionId::new(3), "print('olleh')".into()))
        .await;
    harness.dispatch(ExamIntent::RunCode(QuestionId::new(3))).await;

    let html = harness.render();
    assert!(html.contains("All test cases passed"), "{html}");
    assert!(html.contains("Answered 1 of 3"), "{html}");
}

#[tokio::test(flavor = "current_thread")]
async fn submit_delivers_and_shows_confirmation() {
    let mut harness = setup_view_harness(ViewKind::Exam).await;
    harness.dispatch(ExamIntent::Start(credentials())).await;
    harness
        .dispatch(ExamIntent::SelectOption(QuestionId::new(1), OptionId::new("a")))
        .await;
    harness.dispatch(ExamIntent::Submit).await;

    assert_eq!(harness.phase(), Some(ExamPhase::Submitted));
    let html = harness.render();
    assert!(html.contains("Test submitted successfully!"), "{html}");
    assert!(html.contains("Answered 1 of 3 questions"), "{html}");
    assert_eq!(harness.repo.submissions().expect("submissions").len(), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn failed_delivery_offers_retry_until_it_succeeds() {
    let repo = seeded_repo();
    repo.fail_next_submissions(1).expect("script failure");
    let mut harness = setup_view_harness_with(ViewKind::Exam, repo, false).await;
    harness.dispatch(ExamIntent::Start(credentials())).await;
    harness.dispatch(ExamIntent::Submit).await;

    let html = harness.render();
    assert!(html.contains("could not be sent"), "{html}");
    assert!(html.contains("delivery-retry"), "{html}");
    assert!(harness.repo.submissions().expect("submissions").is_empty());

    harness.dispatch(ExamIntent::RetryDelivery).await;
    let html = harness.render();
    assert!(html.contains("Test submitted successfully!"), "{html}");
    assert_eq!(harness.repo.submissions().expect("submissions").len(), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn logout_returns_to_start_screen() {
    let mut harness = setup_view_harness(ViewKind::Exam).await;
    harness.dispatch(ExamIntent::Start(credentials())).await;
    harness.dispatch(ExamIntent::Logout).await;

    assert_eq!(harness.phase(), Some(ExamPhase::Unauthenticated));
    let html = harness.render();
    assert!(html.contains("Please enter your credentials"), "{html}");
}

#[tokio::test(flavor = "current_thread")]
async fn preview_mode_disables_submission() {
    let harness = setup_view_harness_with(ViewKind::Exam, seeded_repo(), true).await;

    assert_eq!(harness.phase(), Some(ExamPhase::Preview));
    let html = harness.render();
    assert!(html.contains("Preview"), "{html}");
    assert!(html.contains("Preview mode: submission is disabled"), "{html}");
    assert!(!html.contains("exam-submit"), "{html}");
    assert!(!html.contains("exam-logout"), "{html}");
}

#[tokio::test(flavor = "current_thread")]
async fn unknown_test_renders_not_found() {
    let harness =
        setup_view_harness_with(ViewKind::Exam, InMemoryRepository::new(), false).await;
    let html = harness.render();
    assert!(html.contains("This test could not be found."), "{html}");
    assert!(!html.contains("Retry"), "{html}");
}

#[tokio::test(flavor = "current_thread")]
async fn ranking_view_smoke_renders_rows() {
    let harness = setup_view_harness(ViewKind::Ranking).await;
    let html = harness.render();
    assert!(html.contains("Rankings"), "{html}");
    assert!(html.contains("Ada"), "{html}");
    assert!(html.contains("Acme"), "{html}");
    assert!(html.contains("90.0%"), "{html}");
    assert!(html.contains("60.0%"), "{html}");
    assert!(html.contains("ranking-row--podium"), "{html}");
    assert!(html.contains("Search by name"), "{html}");
    assert!(html.contains("aria-sort=\"none\""), "{html}");
    assert!(!html.contains("Your ranking"), "{html}");
}

#[tokio::test(flavor = "current_thread")]
async fn ranking_view_shows_the_signed_in_candidate() {
    let harness = setup_ranking_as(UserId::new("u2")).await;
    let html = harness.render();
    assert!(html.contains("Your ranking"), "{html}");
    assert!(html.contains("#2"), "{html}");
    assert!(html.contains("60.0%"), "{html}");
    assert!(html.contains("ranking-row--you"), "{html}");
}

#[tokio::test(flavor = "current_thread")]
async fn sign_in_and_logout_track_the_current_user() {
    let mut harness = setup_view_harness(ViewKind::Exam).await;
    assert_eq!(harness.current_user(), None);

    harness.dispatch(ExamIntent::Start(credentials())).await;
    assert_eq!(harness.current_user(), Some(UserId::new("ada@example.com")));

    harness.dispatch(ExamIntent::Logout).await;
    assert_eq!(harness.current_user(), None);
}

#[tokio::test(flavor = "current_thread")]
async fn ranking_view_smoke_renders_empty_state() {
    let harness =
        setup_view_harness_with(ViewKind::Ranking, InMemoryRepository::new(), false).await;
    let html = harness.render();
    assert!(html.contains("No results yet."), "{html}");
}

struct FailingResults;

#[async_trait]
impl ResultRepository for FailingResults {
    async fn list_results(&self) -> Result<Vec<TestResult>, StorageError> {
        Err(StorageError::Connection("results offline".into()))
    }
}

#[tokio::test(flavor = "current_thread")]
async fn ranking_view_smoke_renders_error_with_retry() {
    let repo = seeded_repo();
    let mut storage = Storage::from_in_memory(&repo);
    storage.results = Arc::new(FailingResults);
    let harness = setup_with_storage(ViewKind::Ranking, repo, &storage, false).await;

    let html = harness.render();
    assert!(html.contains("The server could not be reached"), "{html}");
    assert!(html.contains("Retry"), "{html}");
}
