use std::cmp::Ordering;

use testcraft_core::model::{Ranking, UserId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RankingRowVm {
    pub user_id: UserId,
    pub rank: u32,
    pub name: String,
    pub organization: String,
    pub tests_completed: u32,
    pub total_score: u32,
    pub average_str: String,
    pub is_podium: bool,
    pub is_current_user: bool,
}

impl From<&Ranking> for RankingRowVm {
    fn from(row: &Ranking) -> Self {
        Self {
            user_id: row.user_id.clone(),
            rank: row.rank,
            name: row.user_name.clone(),
            organization: row.organization.clone().unwrap_or_else(|| "-".to_string()),
            tests_completed: row.tests_completed,
            total_score: row.total_score,
            average_str: format!("{:.1}%", row.average_percent),
            is_podium: row.rank <= 3 && row.tests_completed > 0,
            is_current_user: false,
        }
    }
}

#[must_use]
pub fn map_ranking_rows(rows: &[Ranking]) -> Vec<RankingRowVm> {
    rows.iter().map(RankingRowVm::from).collect()
}

/// Column the leaderboard table is ordered by.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RankingSortField {
    #[default]
    Rank,
    Average,
    Tests,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RankingSort {
    pub field: RankingSortField,
    pub descending: bool,
}

impl RankingSort {
    /// Clicking the active column flips direction; another column starts ascending.
    #[must_use]
    pub fn toggle(self, field: RankingSortField) -> Self {
        if self.field == field {
            Self {
                field,
                descending: !self.descending,
            }
        } else {
            Self {
                field,
                descending: false,
            }
        }
    }

    /// Value for the header's `aria-sort`.
    #[must_use]
    pub fn aria(self, field: RankingSortField) -> &'static str {
        match (self.field == field, self.descending) {
            (false, _) => "none",
            (true, false) => "ascending",
            (true, true) => "descending",
        }
    }

    fn compare(self, a: &Ranking, b: &Ranking) -> Ordering {
        let ordering = match self.field {
            RankingSortField::Rank => a.rank.cmp(&b.rank),
            RankingSortField::Average => a
                .average_percent
                .partial_cmp(&b.average_percent)
                .unwrap_or(Ordering::Equal),
            RankingSortField::Tests => a.tests_completed.cmp(&b.tests_completed),
        };
        if self.descending { ordering.reverse() } else { ordering }
    }
}

/// Rows whose name contains `query` (case-insensitive), in `sort` order.
/// Ties keep leaderboard order.
#[must_use]
pub fn arrange_rows(
    rows: &[Ranking],
    query: &str,
    sort: RankingSort,
    current_user: Option<&UserId>,
) -> Vec<RankingRowVm> {
    let needle = query.trim().to_lowercase();
    let mut picked: Vec<&Ranking> = rows
        .iter()
        .filter(|r| needle.is_empty() || r.user_name.to_lowercase().contains(&needle))
        .collect();
    picked.sort_by(|a, b| sort.compare(a, b));
    picked
        .into_iter()
        .map(|r| {
            let mut row = RankingRowVm::from(r);
            row.is_current_user = current_user == Some(&r.user_id);
            row
        })
        .collect()
}
