use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use uuid::Uuid;

use crate::dto::test_dto::{CreateQuestionRequest, CreateTestRequest};
use crate::error::{Error, Result};
use crate::models::question::{
    ChoiceDetails, ChoiceOption, EssayDetails, Question, QuestionDetails, QuestionType,
    TextAnswerDetails,
};
use crate::models::test::TestDefinition;

/// In-memory test catalog: the boundary to the authoring side. Definitions
/// are registered whole and read back whole; attempts snapshot them at
/// `begin`, so nothing here is mutated afterwards.
#[derive(Default)]
pub struct TestService {
    tests: RwLock<HashMap<Uuid, TestDefinition>>,
}

impl TestService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_test(
        &self,
        payload: CreateTestRequest,
        created_by: Option<Uuid>,
    ) -> Result<TestDefinition> {
        let questions = build_questions(payload.questions)?;
        let test = TestDefinition {
            id: Uuid::new_v4(),
            title: payload.title,
            description: payload.description,
            questions,
            duration_minutes: payload.duration_minutes,
            pass_threshold: payload.pass_threshold,
            created_by,
            created_at: Utc::now(),
        };
        self.tests
            .write()
            .expect("test catalog lock poisoned")
            .insert(test.id, test.clone());
        tracing::info!(test_id = %test.id, questions = test.questions.len(), "test registered");
        Ok(test)
    }

    pub fn get_test_by_id(&self, test_id: Uuid) -> Result<TestDefinition> {
        self.tests
            .read()
            .expect("test catalog lock poisoned")
            .get(&test_id)
            .cloned()
            .ok_or_else(|| Error::NotFound("Test not found".to_string()))
    }
}

/// Turns authoring payloads into catalog questions, minting option ids and
/// resolving key indexes against them.
fn build_questions(payloads: Vec<CreateQuestionRequest>) -> Result<Vec<Question>> {
    payloads.into_iter().map(build_question).collect()
}

fn build_question(payload: CreateQuestionRequest) -> Result<Question> {
    if payload.points < 1 {
        return Err(Error::BadRequest(
            "Question points must be a positive integer".to_string(),
        ));
    }

    let details = match payload.question_type {
        QuestionType::SingleChoice | QuestionType::MultipleChoice => {
            let texts = payload.options.unwrap_or_default();
            if texts.len() < 2 {
                return Err(Error::BadRequest(
                    "A choice question needs at least two options".to_string(),
                ));
            }
            let options: Vec<ChoiceOption> = texts
                .into_iter()
                .map(|text| ChoiceOption {
                    id: Uuid::new_v4(),
                    text,
                })
                .collect();

            let key_indexes = payload.correct_options.unwrap_or_default();
            if key_indexes.is_empty() {
                return Err(Error::BadRequest(
                    "A choice question needs at least one correct option".to_string(),
                ));
            }
            if payload.question_type == QuestionType::SingleChoice && key_indexes.len() != 1 {
                return Err(Error::BadRequest(
                    "A single-choice question takes exactly one correct option".to_string(),
                ));
            }
            let correct_option_ids = key_indexes
                .into_iter()
                .map(|idx| {
                    options
                        .get(idx)
                        .map(|o| o.id)
                        .ok_or_else(|| {
                            Error::BadRequest(format!("Correct option index {} out of range", idx))
                        })
                })
                .collect::<Result<Vec<Uuid>>>()?;

            QuestionDetails::Choice(ChoiceDetails {
                options,
                correct_option_ids,
            })
        }
        QuestionType::TextAnswer => {
            let expected = payload
                .expected_answer
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    Error::BadRequest("A text-answer question needs an expected answer".to_string())
                })?;
            QuestionDetails::TextAnswer(TextAnswerDetails {
                expected_answer: expected,
            })
        }
        QuestionType::Essay => QuestionDetails::Essay(EssayDetails {}),
    };

    Ok(Question {
        id: Uuid::new_v4(),
        question_type: payload.question_type,
        text: payload.text,
        points: payload.points,
        details,
    })
}
