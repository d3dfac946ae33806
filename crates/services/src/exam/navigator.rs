use testcraft_core::model::{QuestionId, SectionId, TestDefinition};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Slot {
    question_id: QuestionId,
    section: SectionId,
}

/// Cursor over the authored question order.
///
/// The current section is always the section of the current question;
/// selecting a section moves the cursor to that section's first question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigator {
    slots: Vec<Slot>,
    current: usize,
}

impl Navigator {
    /// Builds a navigator positioned on the first question.
    ///
    /// `TestDefinition` guarantees at least one question.
    #[must_use]
    pub fn new(definition: &TestDefinition) -> Self {
        let slots = definition
            .questions()
            .iter()
            .map(|q| Slot {
                question_id: q.id,
                section: q.section.clone(),
            })
            .collect();
        Self { slots, current: 0 }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question_id(&self) -> QuestionId {
        self.slots[self.current].question_id
    }

    #[must_use]
    pub fn current_section(&self) -> &SectionId {
        &self.slots[self.current].section
    }

    #[must_use]
    pub fn question_at(&self, index: usize) -> Option<QuestionId> {
        self.slots.get(index).map(|s| s.question_id)
    }

    #[must_use]
    pub fn index_of(&self, id: QuestionId) -> Option<usize> {
        self.slots.iter().position(|s| s.question_id == id)
    }

    /// Global indices of the questions in `section`, ascending.
    pub fn indices_in<'a>(&'a self, section: &'a SectionId) -> impl Iterator<Item = usize> + 'a {
        self.slots
            .iter()
            .enumerate()
            .filter(move |(_, s)| &s.section == section)
            .map(|(i, _)| i)
    }

    /// 1-based position of the current question within its section, and the section size.
    #[must_use]
    pub fn position_in_section(&self) -> (usize, usize) {
        let section = self.current_section();
        let mut position = 0;
        let mut total = 0;
        for index in self.indices_in(section) {
            total += 1;
            if index <= self.current {
                position += 1;
            }
        }
        (position, total)
    }

    pub fn select_question(&mut self, index: usize) -> bool {
        if index >= self.slots.len() {
            return false;
        }
        self.current = index;
        debug!(index, section = %self.current_section(), "question selected");
        true
    }

    /// Jumps to the first question of `section`. No-op when the section owns no question.
    pub fn select_section(&mut self, section: &SectionId) -> bool {
        let Some(first) = self.slots.iter().position(|s| &s.section == section) else {
            return false;
        };
        self.current = first;
        debug!(index = first, %section, "section selected");
        true
    }

    #[must_use]
    pub fn can_next(&self) -> bool {
        self.current + 1 < self.slots.len()
    }

    #[must_use]
    pub fn can_previous(&self) -> bool {
        self.current > 0
    }

    pub fn next(&mut self) -> bool {
        if !self.can_next() {
            return false;
        }
        self.select_question(self.current + 1)
    }

    pub fn previous(&mut self) -> bool {
        if !self.can_previous() {
            return false;
        }
        self.select_question(self.current - 1)
    }
}
