use testcraft_core::model::{QuestionId, SectionId};

/// Answered/marked counts for one section, shown in the section selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionProgress {
    pub section: SectionId,
    pub title: String,
    pub total: usize,
    pub answered: usize,
    pub marked: usize,
    pub is_current: bool,
}

/// One button of the question palette in the sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteItem {
    /// Global index, as accepted by `select_question`.
    pub index: usize,
    /// 1-based number within the section.
    pub number_in_section: usize,
    pub question_id: QuestionId,
    pub is_coding: bool,
    pub is_answered: bool,
    pub is_marked: bool,
    pub is_current: bool,
}

/// Aggregated view of the whole session, useful for the footer and submit dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExamProgress {
    pub total: usize,
    pub answered: usize,
    pub marked: usize,
    pub current_index: usize,
}

impl ExamProgress {
    #[must_use]
    pub fn unanswered(&self) -> usize {
        self.total.saturating_sub(self.answered)
    }
}
