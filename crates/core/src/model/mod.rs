mod answer;
mod definition;
mod ids;
mod language;
mod question;
mod result;

pub use ids::{OptionId, ParseIdError, QuestionId, SectionId, SubmissionId, TestId, UserId};

pub use answer::{AnswerEntry, AnswerSnapshot, AnswerValue, QuestionAnswer, SubmitReason};
pub use definition::{DefinitionError, TestDefinition};
pub use language::{Language, UnknownLanguage};
pub use question::{Question, QuestionKind, QuestionOption, QuestionType, Section, TestCase};
pub use result::{Ranking, RunOutcome, TestResult, UserProfile};
