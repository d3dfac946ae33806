use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{SubmissionId, TestId, UserId};

/// Latest response from the code-run collaborator for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub passed: bool,
    pub output: String,
}

/// Graded result of one submission, produced by the external grader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub id: SubmissionId,
    pub test_id: TestId,
    pub user_id: UserId,
    pub score: u32,
    pub max_score: u32,
    pub submitted_at: DateTime<Utc>,
    pub completion_seconds: u32,
}

impl TestResult {
    /// Score as a percentage of `max_score`; zero when `max_score` is zero.
    #[must_use]
    pub fn percent(&self) -> f64 {
        if self.max_score == 0 {
            0.0
        } else {
            f64::from(self.score) / f64::from(self.max_score) * 100.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub name: String,
    pub organization: Option<String>,
}

/// One row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    pub user_id: UserId,
    pub user_name: String,
    pub organization: Option<String>,
    pub total_score: u32,
    pub tests_completed: u32,
    pub average_percent: f64,
    pub rank: u32,
}
