use serde::{Deserialize, Serialize};

use crate::model::ids::{OptionId, QuestionId, SectionId};

/// Named grouping of questions shown in the section selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub title: String,
    pub description: String,
}

impl Section {
    #[must_use]
    pub fn new(id: SectionId, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: OptionId,
    pub text: String,
}

impl QuestionOption {
    #[must_use]
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: OptionId::new(id),
            text: text.into(),
        }
    }
}

/// Input/expected-output pair attached to a coding question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    pub expected_output: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    Coding,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice {
        options: Vec<QuestionOption>,
    },
    Coding {
        #[serde(default)]
        code_template: String,
        #[serde(default)]
        test_cases: Vec<TestCase>,
    },
}

/// A single authored question. Immutable during a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub section: SectionId,
    pub kind: QuestionKind,
}

impl Question {
    #[must_use]
    pub fn multiple_choice(
        id: QuestionId,
        section: SectionId,
        text: impl Into<String>,
        options: Vec<QuestionOption>,
    ) -> Self {
        Self {
            id,
            text: text.into(),
            section,
            kind: QuestionKind::MultipleChoice { options },
        }
    }

    #[must_use]
    pub fn coding(
        id: QuestionId,
        section: SectionId,
        text: impl Into<String>,
        code_template: impl Into<String>,
        test_cases: Vec<TestCase>,
    ) -> Self {
        Self {
            id,
            text: text.into(),
            section,
            kind: QuestionKind::Coding {
                code_template: code_template.into(),
                test_cases,
            },
        }
    }

    #[must_use]
    pub fn question_type(&self) -> QuestionType {
        match self.kind {
            QuestionKind::MultipleChoice { .. } => QuestionType::MultipleChoice,
            QuestionKind::Coding { .. } => QuestionType::Coding,
        }
    }

    #[must_use]
    pub fn is_coding(&self) -> bool {
        self.question_type() == QuestionType::Coding
    }

    /// Options of a multiple-choice question; empty for coding questions.
    #[must_use]
    pub fn options(&self) -> &[QuestionOption] {
        match &self.kind {
            QuestionKind::MultipleChoice { options } => options,
            QuestionKind::Coding { .. } => &[],
        }
    }

    #[must_use]
    pub fn has_option(&self, option: &OptionId) -> bool {
        self.options().iter().any(|o| &o.id == option)
    }

    #[must_use]
    pub fn code_template(&self) -> Option<&str> {
        match &self.kind {
            QuestionKind::Coding { code_template, .. } => Some(code_template),
            QuestionKind::MultipleChoice { .. } => None,
        }
    }

    #[must_use]
    pub fn test_cases(&self) -> &[TestCase] {
        match &self.kind {
            QuestionKind::Coding { test_cases, .. } => test_cases,
            QuestionKind::MultipleChoice { .. } => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_kind_uses_tagged_json() {
        let q = Question::coding(
            QuestionId::new(2),
            SectionId::new("coding"),
            "Reverse a string",
            "def solve(s):\n",
            vec![],
        );
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["kind"]["type"], "coding");
        let back: Question = serde_json::from_value(json).unwrap();
        assert_eq!(back, q);
    }

    #[test]
    fn coding_question_has_no_options() {
        let q = Question::coding(QuestionId::new(1), SectionId::new("c"), "x", "", vec![]);
        assert!(q.options().is_empty());
        assert!(!q.has_option(&OptionId::new("a")));
        assert_eq!(q.question_type(), QuestionType::Coding);
    }
}
