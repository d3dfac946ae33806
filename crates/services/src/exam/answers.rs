use std::collections::HashMap;

use testcraft_core::model::{
    AnswerEntry, AnswerValue, Language, OptionId, QuestionAnswer, QuestionId, QuestionType,
    TestDefinition,
};

use crate::error::AnswerError;

#[derive(Debug, Clone, PartialEq, Eq)]
struct AnswerSlot {
    kind: QuestionType,
    options: Vec<OptionId>,
    answer: QuestionAnswer,
}

/// Per-question answer state, keyed by question id.
///
/// Writes are last-write-wins. No history is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerStore {
    slots: HashMap<QuestionId, AnswerSlot>,
}

impl AnswerStore {
    #[must_use]
    pub fn new(definition: &TestDefinition) -> Self {
        let slots = definition
            .questions()
            .iter()
            .map(|q| {
                let slot = AnswerSlot {
                    kind: q.question_type(),
                    options: q.options().iter().map(|o| o.id.clone()).collect(),
                    answer: QuestionAnswer::default(),
                };
                (q.id, slot)
            })
            .collect();
        Self { slots }
    }

    fn slot_mut(&mut self, id: QuestionId) -> Result<&mut AnswerSlot, AnswerError> {
        self.slots.get_mut(&id).ok_or(AnswerError::UnknownQuestion(id))
    }

    #[must_use]
    pub fn get(&self, id: QuestionId) -> Option<&QuestionAnswer> {
        self.slots.get(&id).map(|s| &s.answer)
    }

    /// Flips the review mark and returns the new value.
    ///
    /// # Errors
    ///
    /// Returns `AnswerError::UnknownQuestion` for ids outside the test.
    pub fn toggle_mark(&mut self, id: QuestionId) -> Result<bool, AnswerError> {
        let slot = self.slot_mut(id)?;
        slot.answer.is_marked = !slot.answer.is_marked;
        Ok(slot.answer.is_marked)
    }

    /// # Errors
    ///
    /// Returns `AnswerError::KindMismatch` when the value does not fit the
    /// question type, or `AnswerError::UnknownOption` when the option is not
    /// one of the question's options. State is unchanged on error.
    pub fn set_answer(&mut self, id: QuestionId, value: AnswerValue) -> Result<(), AnswerError> {
        let slot = self.slot_mut(id)?;
        match (slot.kind, value) {
            (QuestionType::MultipleChoice, AnswerValue::Option(option)) => {
                if !slot.options.contains(&option) {
                    return Err(AnswerError::UnknownOption {
                        question: id,
                        option,
                    });
                }
                slot.answer.selected_option = Some(option);
            }
            (QuestionType::Coding, AnswerValue::Code(code)) => {
                slot.answer.user_code = Some(code);
            }
            (expected, _) => {
                return Err(AnswerError::KindMismatch {
                    question: id,
                    expected,
                });
            }
        }
        Ok(())
    }

    /// Removes the selected option or the written code. The mark is kept.
    ///
    /// # Errors
    ///
    /// Returns `AnswerError::UnknownQuestion` for ids outside the test.
    pub fn clear_answer(&mut self, id: QuestionId) -> Result<(), AnswerError> {
        let slot = self.slot_mut(id)?;
        slot.answer.selected_option = None;
        slot.answer.user_code = None;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `AnswerError::KindMismatch` for multiple-choice questions.
    pub fn set_language(&mut self, id: QuestionId, language: Language) -> Result<(), AnswerError> {
        let slot = self.slot_mut(id)?;
        if slot.kind != QuestionType::Coding {
            return Err(AnswerError::KindMismatch {
                question: id,
                expected: slot.kind,
            });
        }
        slot.answer.language = language;
        Ok(())
    }

    #[must_use]
    pub fn is_answered(&self, id: QuestionId) -> bool {
        self.slots.get(&id).is_some_and(|slot| match slot.kind {
            QuestionType::MultipleChoice => slot.answer.selected_option.is_some(),
            QuestionType::Coding => slot
                .answer
                .user_code
                .as_deref()
                .is_some_and(|c| !c.trim().is_empty()),
        })
    }

    #[must_use]
    pub fn is_marked(&self, id: QuestionId) -> bool {
        self.get(id).is_some_and(|a| a.is_marked)
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.slots.keys().filter(|id| self.is_answered(**id)).count()
    }

    /// One entry per id in `order`, answered or not.
    #[must_use]
    pub fn snapshot(&self, order: &[QuestionId]) -> Vec<AnswerEntry> {
        order
            .iter()
            .filter_map(|id| {
                let slot = self.slots.get(id)?;
                let is_coding = slot.kind == QuestionType::Coding;
                Some(AnswerEntry {
                    question_id: *id,
                    selected_option: slot.answer.selected_option.clone(),
                    user_code: slot.answer.user_code.clone(),
                    language: is_coding.then_some(slot.answer.language),
                    is_marked: slot.answer.is_marked,
                })
            })
            .collect()
    }
}
