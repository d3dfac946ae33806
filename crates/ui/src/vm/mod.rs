mod exam_vm;
mod markdown_vm;
mod ranking_vm;
mod tick_ledger;
mod time_fmt;

pub use exam_vm::{ExamIntent, ExamVm, load_exam, view_error};
pub use markdown_vm::{markdown_to_html, sanitize_html};
pub use ranking_vm::{RankingRowVm, RankingSort, RankingSortField, arrange_rows, map_ranking_rows};
pub use tick_ledger::TickLedger;
pub use time_fmt::{format_datetime, format_duration};
