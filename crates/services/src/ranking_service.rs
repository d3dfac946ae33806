use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use storage::repository::{ResultRepository, UserDirectory};
use testcraft_core::model::{Ranking, TestResult, UserId, UserProfile};
use tracing::debug;

use crate::error::RankingError;

//
// ─── AGGREGATION ───────────────────────────────────────────────────────────────
//

#[derive(Default)]
struct Tally {
    total_score: u32,
    tests_completed: u32,
    percent_sum: f64,
}

/// Aggregate results per user and assign ranks 1..n.
///
/// Every directory user gets a row, results from users missing in the
/// directory are listed under their id. Order: average percent desc, total
/// score desc, then name and id asc.
#[must_use]
pub fn compute_rankings(users: &[UserProfile], results: &[TestResult]) -> Vec<Ranking> {
    let mut tallies: HashMap<&UserId, Tally> = HashMap::new();
    for result in results {
        let tally = tallies.entry(&result.user_id).or_default();
        tally.total_score = tally.total_score.saturating_add(result.score);
        tally.tests_completed += 1;
        tally.percent_sum += result.percent();
    }

    let mut rows: Vec<Ranking> = users
        .iter()
        .map(|u| (u.user_id.clone(), u.name.clone(), u.organization.clone()))
        .chain(
            tallies
                .keys()
                .filter(|id| !users.iter().any(|u| &u.user_id == **id))
                .map(|id| ((*id).clone(), id.to_string(), None)),
        )
        .map(|(user_id, user_name, organization)| {
            let tally = tallies.get(&user_id);
            let tests_completed = tally.map_or(0, |t| t.tests_completed);
            let average_percent = match tally {
                Some(t) if t.tests_completed > 0 => t.percent_sum / f64::from(t.tests_completed),
                _ => 0.0,
            };
            Ranking {
                total_score: tally.map_or(0, |t| t.total_score),
                tests_completed,
                average_percent,
                user_id,
                user_name,
                organization,
                rank: 0,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.average_percent
            .partial_cmp(&a.average_percent)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.total_score.cmp(&a.total_score))
            .then_with(|| a.user_name.cmp(&b.user_name))
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    for (rank, row) in (1..).zip(rows.iter_mut()) {
        row.rank = rank;
    }
    rows
}

/// Row of `user_id` in an already computed leaderboard.
#[must_use]
pub fn for_user<'a>(rows: &'a [Ranking], user_id: &UserId) -> Option<&'a Ranking> {
    rows.iter().find(|r| &r.user_id == user_id)
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Leaderboard over graded results.
#[derive(Clone)]
pub struct RankingService {
    results: Arc<dyn ResultRepository>,
    users: Arc<dyn UserDirectory>,
}

impl RankingService {
    #[must_use]
    pub fn new(results: Arc<dyn ResultRepository>, users: Arc<dyn UserDirectory>) -> Self {
        Self { results, users }
    }

    /// Full leaderboard.
    ///
    /// # Errors
    ///
    /// Returns `RankingError::Storage` if results or users cannot be fetched.
    pub async fn rankings(&self) -> Result<Vec<Ranking>, RankingError> {
        let users = self.users.list_users().await?;
        let results = self.results.list_results().await?;
        let rows = compute_rankings(&users, &results);
        debug!(users = users.len(), results = results.len(), "rankings computed");
        Ok(rows)
    }
}
