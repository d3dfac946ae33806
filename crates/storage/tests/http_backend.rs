use serde_json::json;
use storage::repository::{AccessError, StorageError};
use storage::{
    AccessValidator, CodeRunner, HttpBackend, HttpConfig, ResultRepository, SubmissionRepository,
    TestRepository, UserDirectory,
};
use testcraft_core::model::{
    AnswerEntry, AnswerSnapshot, Language, OptionId, QuestionId, SubmitReason, TestCase, TestId,
    UserId,
};
use testcraft_core::time::fixed_now;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend(server: &MockServer) -> HttpBackend {
    HttpBackend::new(HttpConfig::new(&server.uri()).unwrap()).unwrap()
}

#[tokio::test]
async fn loads_and_validates_test_definition() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tests/12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 12,
            "title": "Frontend basics",
            "description": "Warm-up",
            "duration": 30,
            "sections": [{ "id": "frontend", "title": "Frontend" }],
            "questions": [{
                "id": 5, "type": "mcq", "section": "frontend",
                "question": "What does CSS stand for?",
                "options": [
                    { "id": "a", "text": "Cascading Style Sheets" },
                    { "id": "b", "text": "Computer Style Sheets" }
                ]
            }]
        })))
        .mount(&server)
        .await;

    let def = backend(&server)
        .load_test_definition(TestId::new(12))
        .await
        .unwrap();
    assert_eq!(def.title(), "Frontend basics");
    assert_eq!(def.duration_seconds(), 1800);
    assert_eq!(def.questions()[0].options().len(), 2);
}

#[tokio::test]
async fn missing_test_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tests/99"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = backend(&server)
        .load_test_definition(TestId::new(99))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn rejected_access_code_is_denied() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tests/12/access"))
        .and(body_partial_json(json!({ "email": "a@b.io", "accessCode": "bad" })))
        .respond_with(ResponseTemplate::new(403).set_body_string("Invalid access code"))
        .mount(&server)
        .await;

    let err = backend(&server)
        .validate_access_code(TestId::new(12), "a@b.io", "bad")
        .await
        .unwrap_err();
    match err {
        AccessError::Denied(message) => assert_eq!(message, "Invalid access code"),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn accepted_access_code_returns_grant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tests/12/access"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "userId": "u-17", "email": "a@b.io" })),
        )
        .mount(&server)
        .await;

    let grant = backend(&server)
        .validate_access_code(TestId::new(12), "a@b.io", "OPEN")
        .await
        .unwrap();
    assert_eq!(grant.user_id, UserId::new("u-17"));
}

#[tokio::test]
async fn submission_posts_every_entry() {
    let server = MockServer::start().await;
    let receipt = "6f9b8f52-1d55-4c3b-8d8e-5b0f2a7d9e10";
    Mock::given(method("POST"))
        .and(path("/tests/12/submissions"))
        .and(body_partial_json(json!({
            "userId": "u-17",
            "reason": "time_expired",
            "answers": [
                { "questionId": 1, "selectedOption": "b", "isMarked": false },
                { "questionId": 2, "code": "print(1)", "language": "python", "isMarked": true }
            ]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": receipt })))
        .expect(1)
        .mount(&server)
        .await;

    let snapshot = AnswerSnapshot {
        test_id: TestId::new(12),
        user_id: UserId::new("u-17"),
        submitted_at: fixed_now(),
        elapsed_seconds: 600,
        reason: SubmitReason::TimeExpired,
        entries: vec![
            AnswerEntry {
                question_id: QuestionId::new(1),
                selected_option: Some(OptionId::new("b")),
                user_code: None,
                language: None,
                is_marked: false,
            },
            AnswerEntry {
                question_id: QuestionId::new(2),
                selected_option: None,
                user_code: Some("print(1)".into()),
                language: Some(Language::Python),
                is_marked: true,
            },
        ],
    };

    let id = backend(&server).submit_session(&snapshot).await.unwrap();
    assert_eq!(id.to_string(), receipt);
}

#[tokio::test]
async fn server_error_on_submit_is_a_connection_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tests/1/submissions"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let snapshot = AnswerSnapshot {
        test_id: TestId::new(1),
        user_id: UserId::new("u"),
        submitted_at: fixed_now(),
        elapsed_seconds: 1,
        reason: SubmitReason::Manual,
        entries: Vec::new(),
    };
    let err = backend(&server).submit_session(&snapshot).await.unwrap_err();
    assert!(matches!(err, StorageError::Connection(_)));
}

#[tokio::test]
async fn run_code_returns_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/code/run"))
        .and(body_partial_json(json!({
            "language": "cpp",
            "testCases": [{ "input": "2 3", "expectedOutput": "5" }]
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "passed": true, "output": "1/1 test cases passed" })),
        )
        .mount(&server)
        .await;

    let outcome = backend(&server)
        .run_code(
            "int main() {}",
            Language::Cpp,
            &[TestCase {
                input: "2 3".into(),
                expected_output: "5".into(),
            }],
        )
        .await
        .unwrap();
    assert!(outcome.passed);
    assert_eq!(outcome.output, "1/1 test cases passed");
}

#[tokio::test]
async fn lists_results_and_users() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/results"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "6f9b8f52-1d55-4c3b-8d8e-5b0f2a7d9e10",
            "testId": 12,
            "userId": "u-17",
            "score": 8,
            "maxScore": 10,
            "submittedAt": "2024-05-01T10:00:00Z",
            "completionTime": 900
        }])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "u-17", "name": "Grace", "organization": "Navy" }
        ])))
        .mount(&server)
        .await;

    let backend = backend(&server);
    let results = backend.list_results().await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].completion_seconds, 900);

    let users = backend.list_users().await.unwrap();
    assert_eq!(users[0].name, "Grace");
    assert_eq!(users[0].organization.as_deref(), Some("Navy"));
}

#[tokio::test]
async fn malformed_body_is_a_serialization_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = backend(&server).list_users().await.unwrap_err();
    assert!(matches!(err, StorageError::Serialization(_)));
}
