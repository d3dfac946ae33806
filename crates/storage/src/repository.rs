use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use testcraft_core::model::{
    AnswerSnapshot, Language, RunOutcome, SubmissionId, TestCase, TestDefinition, TestId,
    TestResult, UserId, UserProfile,
};
use thiserror::Error;

/// Errors surfaced by collaborator adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("request rejected: {0}")]
    Rejected(String),
}

impl StorageError {
    /// Whether repeating the same request may succeed. Only transport-level
    /// failures qualify; a refusal or conflict will be answered the same way again.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Connection(_))
    }
}

/// Outcome of a successful access-code check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGrant {
    pub user_id: UserId,
    pub email: String,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AccessError {
    #[error("access denied: {0}")]
    Denied(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Source of authored test definitions.
#[async_trait]
pub trait TestRepository: Send + Sync {
    /// Fetch and validate the definition for a test.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the test does not exist, or
    /// `StorageError::Serialization` if the payload fails model validation.
    async fn load_test_definition(&self, id: TestId) -> Result<TestDefinition, StorageError>;
}

/// Checks start-screen credentials against the real test.
#[async_trait]
pub trait AccessValidator: Send + Sync {
    /// # Errors
    ///
    /// Returns `AccessError::Denied` when the code is wrong for this test,
    /// or `AccessError::Storage` when the collaborator cannot be reached.
    async fn validate_access_code(
        &self,
        test_id: TestId,
        email: &str,
        access_code: &str,
    ) -> Result<AccessGrant, AccessError>;
}

/// Receives answer snapshots for grading and storage.
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot was not accepted.
    async fn submit_session(&self, snapshot: &AnswerSnapshot) -> Result<SubmissionId, StorageError>;
}

/// Request/response code execution. Keeps no state between calls.
#[async_trait]
pub trait CodeRunner: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the runner is unavailable.
    async fn run_code(
        &self,
        code: &str,
        language: Language,
        test_cases: &[TestCase],
    ) -> Result<RunOutcome, StorageError>;
}

#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if results cannot be fetched.
    async fn list_results(&self) -> Result<Vec<TestResult>, StorageError>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the directory cannot be fetched.
    async fn list_users(&self) -> Result<Vec<UserProfile>, StorageError>;
}

/// Stores newly authored tests.
#[async_trait]
pub trait TestPublisher: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if a test with the same id exists.
    async fn publish_test(
        &self,
        definition: &TestDefinition,
        access_code: &str,
    ) -> Result<(), StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

#[derive(Default)]
struct InMemoryState {
    tests: HashMap<TestId, TestDefinition>,
    access_codes: HashMap<TestId, String>,
    submissions: Vec<(SubmissionId, AnswerSnapshot)>,
    failing_submissions: u32,
    results: Vec<TestResult>,
    users: Vec<UserProfile>,
    run_outcome: Option<RunOutcome>,
}

/// In-memory stand-in for the backend, used by tests and the offline demo.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(
        &self,
        f: impl FnOnce(&mut InMemoryState) -> T,
    ) -> Result<T, StorageError> {
        let mut guard = self
            .state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(f(&mut guard))
    }

    /// Register a test together with the access code that unlocks it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the state lock is poisoned.
    pub fn insert_test(
        &self,
        definition: TestDefinition,
        access_code: impl Into<String>,
    ) -> Result<(), StorageError> {
        let code = access_code.into();
        self.with_state(|s| {
            s.access_codes.insert(definition.id(), code);
            s.tests.insert(definition.id(), definition);
        })
    }

    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the state lock is poisoned.
    pub fn insert_user(&self, user: UserProfile) -> Result<(), StorageError> {
        self.with_state(|s| s.users.push(user))
    }

    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the state lock is poisoned.
    pub fn insert_result(&self, result: TestResult) -> Result<(), StorageError> {
        self.with_state(|s| s.results.push(result))
    }

    /// Make the next `count` submissions fail with a connection error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the state lock is poisoned.
    pub fn fail_next_submissions(&self, count: u32) -> Result<(), StorageError> {
        self.with_state(|s| s.failing_submissions = count)
    }

    /// Script the response returned by `run_code`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the state lock is poisoned.
    pub fn set_run_outcome(&self, outcome: RunOutcome) -> Result<(), StorageError> {
        self.with_state(|s| s.run_outcome = Some(outcome))
    }

    /// Snapshots accepted so far, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the state lock is poisoned.
    pub fn submissions(&self) -> Result<Vec<AnswerSnapshot>, StorageError> {
        self.with_state(|s| s.submissions.iter().map(|(_, snap)| snap.clone()).collect())
    }
}

#[async_trait]
impl TestRepository for InMemoryRepository {
    async fn load_test_definition(&self, id: TestId) -> Result<TestDefinition, StorageError> {
        self.with_state(|s| s.tests.get(&id).cloned())?
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl AccessValidator for InMemoryRepository {
    async fn validate_access_code(
        &self,
        test_id: TestId,
        email: &str,
        access_code: &str,
    ) -> Result<AccessGrant, AccessError> {
        let expected = self.with_state(|s| s.access_codes.get(&test_id).cloned())?;
        match expected {
            Some(code) if code == access_code.trim() => {
                let email = email.trim().to_ascii_lowercase();
                Ok(AccessGrant {
                    user_id: UserId::new(email.clone()),
                    email,
                })
            }
            Some(_) => Err(AccessError::Denied("invalid access code".into())),
            None => Err(AccessError::Denied("unknown test".into())),
        }
    }
}

#[async_trait]
impl SubmissionRepository for InMemoryRepository {
    async fn submit_session(&self, snapshot: &AnswerSnapshot) -> Result<SubmissionId, StorageError> {
        self.with_state(|s| {
            if s.failing_submissions > 0 {
                s.failing_submissions -= 1;
                return Err(StorageError::Connection("submission endpoint unavailable".into()));
            }
            let id = SubmissionId::new_v4();
            s.submissions.push((id, snapshot.clone()));
            Ok(id)
        })?
    }
}

#[async_trait]
impl CodeRunner for InMemoryRepository {
    async fn run_code(
        &self,
        code: &str,
        language: Language,
        test_cases: &[TestCase],
    ) -> Result<RunOutcome, StorageError> {
        if let Some(outcome) = self.with_state(|s| s.run_outcome.clone())? {
            return Ok(outcome);
        }
        let lines = code.lines().filter(|l| !l.trim().is_empty()).count();
        Ok(RunOutcome {
            passed: false,
            output: format!(
                "Received {lines} line(s) of {language} against {} test case(s).\nCode execution is not available offline.",
                test_cases.len()
            ),
        })
    }
}

#[async_trait]
impl TestPublisher for InMemoryRepository {
    async fn publish_test(
        &self,
        definition: &TestDefinition,
        access_code: &str,
    ) -> Result<(), StorageError> {
        self.with_state(|s| {
            if s.tests.contains_key(&definition.id()) {
                return Err(StorageError::Conflict);
            }
            s.access_codes
                .insert(definition.id(), access_code.trim().to_string());
            s.tests.insert(definition.id(), definition.clone());
            Ok(())
        })?
    }
}

#[async_trait]
impl ResultRepository for InMemoryRepository {
    async fn list_results(&self) -> Result<Vec<TestResult>, StorageError> {
        self.with_state(|s| s.results.clone())
    }
}

#[async_trait]
impl UserDirectory for InMemoryRepository {
    async fn list_users(&self) -> Result<Vec<UserProfile>, StorageError> {
        self.with_state(|s| s.users.clone())
    }
}

/// Aggregates collaborator contracts behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub tests: Arc<dyn TestRepository>,
    pub access: Arc<dyn AccessValidator>,
    pub submissions: Arc<dyn SubmissionRepository>,
    pub code_runner: Arc<dyn CodeRunner>,
    pub results: Arc<dyn ResultRepository>,
    pub users: Arc<dyn UserDirectory>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_in_memory(&InMemoryRepository::new())
    }

    /// Wire every contract to a shared in-memory repository (e.g. one seeded with fixtures).
    #[must_use]
    pub fn from_in_memory(repo: &InMemoryRepository) -> Self {
        Self {
            tests: Arc::new(repo.clone()),
            access: Arc::new(repo.clone()),
            submissions: Arc::new(repo.clone()),
            code_runner: Arc::new(repo.clone()),
            results: Arc::new(repo.clone()),
            users: Arc::new(repo.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testcraft_core::model::{Question, QuestionId, QuestionOption, Section, SectionId, SubmitReason};
    use testcraft_core::time::fixed_now;

    fn definition() -> TestDefinition {
        TestDefinition::new(
            TestId::new(7),
            "Quiz",
            "",
            300,
            vec![Section::new(SectionId::new("general"), "General", "")],
            vec![Question::multiple_choice(
                QuestionId::new(1),
                SectionId::new("general"),
                "Pick one",
                vec![QuestionOption::new("a", "A")],
            )],
        )
        .unwrap()
    }

    fn snapshot() -> AnswerSnapshot {
        AnswerSnapshot {
            test_id: TestId::new(7),
            user_id: UserId::new("student@example.com"),
            submitted_at: fixed_now(),
            elapsed_seconds: 10,
            reason: SubmitReason::Manual,
            entries: Vec::new(),
        }
    }

    #[tokio::test]
    async fn published_test_unlocks_once_and_refuses_a_second_copy() {
        let repo = InMemoryRepository::new();
        repo.publish_test(&definition(), " NEW-CODE ").await.unwrap();

        let loaded = repo.load_test_definition(TestId::new(7)).await.unwrap();
        assert_eq!(loaded.title(), "Quiz");
        repo.validate_access_code(TestId::new(7), "a@b.io", "NEW-CODE")
            .await
            .unwrap();

        let err = repo.publish_test(&definition(), "OTHER").await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
        assert!(
            repo.validate_access_code(TestId::new(7), "a@b.io", "OTHER")
                .await
                .is_err()
        );
    }

    #[test]
    fn only_connection_errors_are_transient() {
        assert!(StorageError::Connection("timeout".into()).is_transient());
        assert!(!StorageError::Conflict.is_transient());
        assert!(!StorageError::Rejected("bad payload".into()).is_transient());
        assert!(!StorageError::NotFound.is_transient());
        assert!(!StorageError::Serialization("eof".into()).is_transient());
    }

    #[tokio::test]
    async fn access_code_is_checked_per_test() {
        let repo = InMemoryRepository::new();
        repo.insert_test(definition(), "OPEN-7").unwrap();

        let grant = repo
            .validate_access_code(TestId::new(7), " Student@Example.com ", "OPEN-7")
            .await
            .unwrap();
        assert_eq!(grant.user_id, UserId::new("student@example.com"));

        let denied = repo
            .validate_access_code(TestId::new(7), "student@example.com", "nope")
            .await
            .unwrap_err();
        assert!(matches!(denied, AccessError::Denied(_)));

        let unknown = repo
            .validate_access_code(TestId::new(8), "student@example.com", "OPEN-7")
            .await
            .unwrap_err();
        assert!(matches!(unknown, AccessError::Denied(_)));
    }

    #[tokio::test]
    async fn scripted_submission_failures_are_consumed() {
        let repo = InMemoryRepository::new();
        repo.fail_next_submissions(1).unwrap();

        assert!(repo.submit_session(&snapshot()).await.is_err());
        assert!(repo.submit_session(&snapshot()).await.is_ok());
        assert_eq!(repo.submissions().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_test_is_not_found() {
        let repo = InMemoryRepository::new();
        let err = repo.load_test_definition(TestId::new(1)).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }
}
