//! Fixtures for running the desktop app without a backend.

use services::{AuthoringError, TestDraft};
use storage::repository::{InMemoryRepository, StorageError};
use thiserror::Error;
use testcraft_core::Clock;
use testcraft_core::model::{
    QuestionKind, QuestionOption, SectionId, SubmissionId, TestCase, TestDefinition, TestId,
    TestResult, UserId, UserProfile,
};

pub const DEMO_ACCESS_CODE: &str = "DEMO-2024";

fn choices(options: &[(&str, &str)]) -> QuestionKind {
    QuestionKind::MultipleChoice {
        options: options
            .iter()
            .map(|(key, label)| QuestionOption::new(*key, *label))
            .collect(),
    }
}

fn coding(cases: &[(&str, &str)]) -> QuestionKind {
    QuestionKind::Coding {
        code_template: String::new(),
        test_cases: cases
            .iter()
            .map(|(input, expected)| TestCase {
                input: (*input).into(),
                expected_output: (*expected).into(),
            })
            .collect(),
    }
}

/// # Errors
///
/// Returns `AuthoringError` if the fixture breaks a model invariant.
pub fn demo_definition(test_id: TestId) -> Result<TestDefinition, AuthoringError> {
    let mut draft = TestDraft::new();
    draft.set_details(
        "Full Stack Developer Assessment",
        "A short assessment covering general knowledge, web development and a coding task.",
        90 * 60,
    );
    for (id, title, description) in [
        ("general", "General Knowledge", "Basic programming concepts"),
        ("frontend", "Frontend", "HTML, CSS and the browser"),
        ("backend", "Backend", "Servers, HTTP and databases"),
        ("coding", "Coding Challenges", "Write and run real code"),
    ] {
        draft.add_section(id, title, description)?;
    }

    let questions = [
        (
            "general",
            "Which data structure works on a **first in, first out** basis?",
            choices(&[("a", "Stack"), ("b", "Queue"), ("c", "Tree"), ("d", "Graph")]),
        ),
        (
            "general",
            "What is the time complexity of binary search on a sorted array?",
            choices(&[("a", "O(n)"), ("b", "O(log n)"), ("c", "O(n log n)"), ("d", "O(1)")]),
        ),
        (
            "frontend",
            "What does `HTML` stand for?",
            choices(&[
                ("a", "Hyper Text Markup Language"),
                ("b", "High Tech Modern Language"),
                ("c", "Hyperlink and Text Markup Language"),
            ]),
        ),
        (
            "frontend",
            "Which CSS property changes the text color of an element?",
            choices(&[("a", "font-color"), ("b", "text-color"), ("c", "color")]),
        ),
        (
            "backend",
            "Which HTTP status code means *Not Found*?",
            choices(&[("a", "200"), ("b", "301"), ("c", "404"), ("d", "500")]),
        ),
        (
            "backend",
            "Which SQL clause filters rows after grouping?",
            choices(&[("a", "WHERE"), ("b", "HAVING"), ("c", "ORDER BY")]),
        ),
        (
            "backend",
            "Which HTTP method is idempotent?",
            choices(&[("a", "POST"), ("b", "PUT"), ("c", "PATCH")]),
        ),
        (
            "coding",
            "Write a program that reads a string from standard input and prints it **reversed**.",
            coding(&[("hello", "olleh"), ("testcraft", "tfarctset")]),
        ),
        (
            "coding",
            "Read an integer `n` and print the sum of all integers from 1 to `n`.",
            coding(&[("3", "6"), ("10", "55")]),
        ),
    ];
    for (section, text, kind) in questions {
        draft.add_question(&SectionId::new(section), text, kind)?;
    }

    draft.build(test_id)
}

/// Repository seeded with the demo test, a few users and their graded results.
///
/// # Errors
///
/// Returns `DemoError` if a fixture is invalid or the repository rejects it.
pub fn demo_repository(test_id: TestId, clock: &Clock) -> Result<InMemoryRepository, DemoError> {
    let repo = InMemoryRepository::new();
    repo.insert_test(demo_definition(test_id)?, DEMO_ACCESS_CODE)?;

    let people = [
        ("u-ada", "Ada Lovelace", Some("Analytical Engines")),
        ("u-grace", "Grace Hopper", Some("US Navy")),
        ("u-linus", "Linus Torvalds", None),
        ("u-margaret", "Margaret Hamilton", Some("MIT")),
    ];
    for (id, name, org) in people {
        repo.insert_user(UserProfile {
            user_id: UserId::new(id),
            name: name.into(),
            organization: org.map(str::to_string),
        })?;
    }

    let now = clock.now();
    let results = [
        ("u-ada", 9, 3100),
        ("u-grace", 8, 2900),
        ("u-grace", 7, 3500),
        ("u-margaret", 6, 4200),
    ];
    for (user, score, seconds) in results {
        repo.insert_result(TestResult {
            id: SubmissionId::new_v4(),
            test_id,
            user_id: UserId::new(user),
            score,
            max_score: 9,
            submitted_at: now,
            completion_seconds: seconds,
        })?;
    }
    Ok(repo)
}

#[derive(Debug, Error)]
pub enum DemoError {
    #[error("invalid demo test: {0}")]
    Definition(#[from] AuthoringError),

    #[error("could not seed demo data: {0}")]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::{AccessValidator, ResultRepository, UserDirectory};
    use testcraft_core::time::fixed_clock;

    #[test]
    fn demo_definition_has_four_sections() {
        let definition = demo_definition(TestId::new(1)).expect("valid demo");
        assert_eq!(definition.sections().len(), 4);
        assert_eq!(definition.questions().len(), 9);
        assert_eq!(definition.duration_seconds(), 5400);
        let ids: Vec<u64> = definition.questions().iter().map(|q| q.id.value()).collect();
        assert_eq!(ids, (1..=9).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn demo_repository_unlocks_with_demo_code() {
        let repo = demo_repository(TestId::new(7), &fixed_clock()).expect("seeded");
        let grant = repo
            .validate_access_code(TestId::new(7), "Someone@Example.com", DEMO_ACCESS_CODE)
            .await
            .expect("demo code accepted");
        assert_eq!(grant.email, "someone@example.com");

        let results = repo.list_results().await.expect("results");
        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| r.test_id == TestId::new(7)));
        assert_eq!(repo.list_users().await.expect("users").len(), 4);
    }
}
