use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub text: String,
    #[serde(default = "default_points")]
    pub points: i32,
    #[serde(flatten)]
    pub details: QuestionDetails,
}

fn default_points() -> i32 {
    1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    SingleChoice,
    MultipleChoice,
    TextAnswer,
    Essay,
}

impl QuestionType {
    pub fn is_choice(self) -> bool {
        matches!(self, Self::SingleChoice | Self::MultipleChoice)
    }

    pub fn is_free_text(self) -> bool {
        matches!(self, Self::TextAnswer | Self::Essay)
    }
}

/// Untagged variants are tried in declaration order; the field-less essay
/// shape must stay last.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionDetails {
    Choice(ChoiceDetails),
    TextAnswer(TextAnswerDetails),
    Essay(EssayDetails),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceDetails {
    pub options: Vec<ChoiceOption>,
    /// Answer key; stripped from every learner-facing view.
    pub correct_option_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub id: Uuid,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextAnswerDetails {
    /// Compared case-insensitively after trimming.
    pub expected_answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EssayDetails {}
