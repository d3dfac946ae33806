//! Wire shapes for the REST backend, camelCase as the backend emits them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use testcraft_core::model::{
    AnswerEntry, AnswerSnapshot, Language, OptionId, Question, QuestionId, QuestionOption,
    RunOutcome, Section, SectionId, SubmissionId, SubmitReason, TestCase, TestDefinition, TestId,
    TestResult, UserId, UserProfile,
};

use crate::repository::StorageError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestDto {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Minutes.
    pub duration: u32,
    pub sections: Vec<SectionDto>,
    pub questions: Vec<QuestionDto>,
}

#[derive(Debug, Deserialize)]
pub struct SectionDto {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuestionTypeDto {
    Mcq,
    Coding,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDto {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: QuestionTypeDto,
    pub section: String,
    pub question: String,
    #[serde(default)]
    pub options: Vec<OptionDto>,
    #[serde(default)]
    pub code_template: Option<String>,
    #[serde(default)]
    pub test_cases: Vec<TestCaseDto>,
}

#[derive(Debug, Deserialize)]
pub struct OptionDto {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseDto {
    pub input: String,
    pub expected_output: String,
}

impl From<TestCaseDto> for TestCase {
    fn from(dto: TestCaseDto) -> Self {
        Self {
            input: dto.input,
            expected_output: dto.expected_output,
        }
    }
}

impl From<&TestCase> for TestCaseDto {
    fn from(case: &TestCase) -> Self {
        Self {
            input: case.input.clone(),
            expected_output: case.expected_output.clone(),
        }
    }
}

impl QuestionDto {
    fn into_question(self) -> Question {
        let id = QuestionId::new(self.id);
        let section = SectionId::new(self.section);
        match self.kind {
            QuestionTypeDto::Mcq => Question::multiple_choice(
                id,
                section,
                self.question,
                self.options
                    .into_iter()
                    .map(|o| QuestionOption::new(o.id, o.text))
                    .collect(),
            ),
            QuestionTypeDto::Coding => Question::coding(
                id,
                section,
                self.question,
                self.code_template.unwrap_or_default(),
                self.test_cases.into_iter().map(TestCase::from).collect(),
            ),
        }
    }
}

impl TestDto {
    /// Converts the payload into a validated definition.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the definition breaks a model invariant.
    pub fn into_definition(self) -> Result<TestDefinition, StorageError> {
        let duration_seconds = self
            .duration
            .checked_mul(60)
            .ok_or_else(|| StorageError::Serialization("test duration overflows".into()))?;
        let sections = self
            .sections
            .into_iter()
            .map(|s| Section::new(SectionId::new(s.id), s.title, s.description))
            .collect();
        let questions = self
            .questions
            .into_iter()
            .map(QuestionDto::into_question)
            .collect();
        TestDefinition::new(
            TestId::new(self.id),
            self.title,
            self.description,
            duration_seconds,
            sections,
            questions,
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRequestDto<'a> {
    pub email: &'a str,
    pub access_code: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessGrantDto {
    pub user_id: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionDto<'a> {
    pub user_id: &'a str,
    pub submitted_at: DateTime<Utc>,
    pub completion_time: u32,
    pub reason: SubmitReason,
    pub answers: Vec<SubmittedAnswerDto<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswerDto<'a> {
    pub question_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_option: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    pub is_marked: bool,
}

impl<'a> From<&'a AnswerEntry> for SubmittedAnswerDto<'a> {
    fn from(entry: &'a AnswerEntry) -> Self {
        Self {
            question_id: entry.question_id.value(),
            selected_option: entry.selected_option.as_ref().map(OptionId::as_str),
            code: entry.user_code.as_deref(),
            language: entry.language,
            is_marked: entry.is_marked,
        }
    }
}

impl<'a> From<&'a AnswerSnapshot> for SubmissionDto<'a> {
    fn from(snapshot: &'a AnswerSnapshot) -> Self {
        Self {
            user_id: snapshot.user_id.as_str(),
            submitted_at: snapshot.submitted_at,
            completion_time: snapshot.elapsed_seconds,
            reason: snapshot.reason,
            answers: snapshot.entries.iter().map(SubmittedAnswerDto::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmissionReceiptDto {
    pub id: SubmissionId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequestDto<'a> {
    pub code: &'a str,
    pub language: Language,
    pub test_cases: Vec<TestCaseDto>,
}

#[derive(Debug, Deserialize)]
pub struct RunResponseDto {
    pub passed: bool,
    #[serde(default)]
    pub output: String,
}

impl From<RunResponseDto> for RunOutcome {
    fn from(dto: RunResponseDto) -> Self {
        Self {
            passed: dto.passed,
            output: dto.output,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResultDto {
    pub id: SubmissionId,
    pub test_id: u64,
    pub user_id: String,
    pub score: u32,
    pub max_score: u32,
    pub submitted_at: DateTime<Utc>,
    /// Seconds.
    pub completion_time: u32,
}

impl From<TestResultDto> for TestResult {
    fn from(dto: TestResultDto) -> Self {
        Self {
            id: dto.id,
            test_id: TestId::new(dto.test_id),
            user_id: UserId::new(dto.user_id),
            score: dto.score,
            max_score: dto.max_score,
            submitted_at: dto.submitted_at,
            completion_seconds: dto.completion_time,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub organization: Option<String>,
}

impl From<UserDto> for UserProfile {
    fn from(dto: UserDto) -> Self {
        Self {
            user_id: UserId::new(dto.id),
            name: dto.name,
            organization: dto.organization.filter(|o| !o.trim().is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_converts_minutes_and_question_kinds() {
        let dto: TestDto = serde_json::from_value(json!({
            "id": 3,
            "title": "Backend screening",
            "duration": 45,
            "sections": [
                { "id": "general", "title": "General" },
                { "id": "coding", "title": "Coding" }
            ],
            "questions": [
                {
                    "id": 1, "type": "mcq", "section": "general",
                    "question": "Which is a **Rust** keyword?",
                    "options": [{ "id": "a", "text": "fn" }, { "id": "b", "text": "def" }]
                },
                {
                    "id": 2, "type": "coding", "section": "coding",
                    "question": "Reverse a string",
                    "testCases": [{ "input": "abc", "expectedOutput": "cba" }]
                }
            ]
        }))
        .unwrap();

        let def = dto.into_definition().unwrap();
        assert_eq!(def.duration_seconds(), 2700);
        assert!(!def.questions()[0].is_coding());
        assert_eq!(def.questions()[1].test_cases().len(), 1);
        assert_eq!(def.questions()[1].code_template(), None);
    }

    #[test]
    fn invalid_definition_maps_to_serialization_error() {
        let dto: TestDto = serde_json::from_value(json!({
            "id": 3,
            "title": "Broken",
            "duration": 10,
            "sections": [{ "id": "general", "title": "General" }],
            "questions": [
                { "id": 1, "type": "mcq", "section": "frontend", "question": "?",
                  "options": [{ "id": "a", "text": "A" }] }
            ]
        }))
        .unwrap();

        assert!(matches!(
            dto.into_definition(),
            Err(StorageError::Serialization(_))
        ));
    }

    #[test]
    fn blank_organization_is_dropped() {
        let dto: UserDto =
            serde_json::from_value(json!({ "id": "u1", "name": "Ada", "organization": "  " }))
                .unwrap();
        assert_eq!(UserProfile::from(dto).organization, None);
    }
}
