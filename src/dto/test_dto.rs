use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::question::{Question, QuestionDetails, QuestionType};
use crate::models::test::TestDefinition;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTestRequest {
    #[validate(length(min = 1))]
    pub title: String,
    pub description: Option<String>,
    /// Zero registers an untimed test.
    #[validate(range(min = 0))]
    pub duration_minutes: i32,
    #[validate(range(min = 0.0, max = 100.0))]
    pub pass_threshold: f64,
    #[validate(length(min = 1, message = "A test needs at least one question"))]
    pub questions: Vec<CreateQuestionRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub text: String,
    pub points: i32,
    /// Choice types only; option ids are minted at registration.
    pub options: Option<Vec<String>>,
    /// Indexes into `options` forming the answer key.
    pub correct_options: Option<Vec<usize>>,
    /// Text-answer questions only.
    pub expected_answer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionView {
    pub id: Uuid,
    pub text: String,
}

/// Question projection served to learners: the answer key and expected
/// answers never appear here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionView {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub text: String,
    pub points: i32,
    pub options: Option<Vec<OptionView>>,
}

impl From<&Question> for QuestionView {
    fn from(question: &Question) -> Self {
        let options = match &question.details {
            QuestionDetails::Choice(details) => Some(
                details
                    .options
                    .iter()
                    .map(|o| OptionView {
                        id: o.id,
                        text: o.text.clone(),
                    })
                    .collect(),
            ),
            _ => None,
        };
        Self {
            id: question.id,
            question_type: question.question_type,
            text: question.text.clone(),
            points: question.points,
            options,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSummaryView {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub duration_minutes: i32,
    pub pass_threshold: f64,
    pub total_questions: usize,
    pub created_at: DateTime<Utc>,
}

impl From<&TestDefinition> for TestSummaryView {
    fn from(test: &TestDefinition) -> Self {
        Self {
            id: test.id,
            title: test.title.clone(),
            description: test.description.clone(),
            duration_minutes: test.duration_minutes,
            pass_threshold: test.pass_threshold,
            total_questions: test.questions.len(),
            created_at: test.created_at,
        }
    }
}
