use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::question::{Question, QuestionType};

/// One learner response. Exactly one of the two payload fields is populated,
/// matching the owning question's type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: Uuid,
    pub selected_option_ids: Option<BTreeSet<Uuid>>,
    pub text_answer: Option<String>,
}

/// In-progress responses of one attempt, keyed by question identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnswerSet {
    answers: HashMap<Uuid, Answer>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a selection for a choice question. Single-choice keeps only the
    /// last option given; any previously stored free text is dropped.
    pub fn set_selection(&mut self, question: &Question, option_ids: Vec<Uuid>) -> Result<()> {
        if !question.question_type.is_choice() {
            return Err(Error::InvalidQuestionType {
                question_id: question.id,
                question_type: question.question_type,
            });
        }
        let selected: BTreeSet<Uuid> = if question.question_type == QuestionType::SingleChoice {
            option_ids.into_iter().last().into_iter().collect()
        } else {
            option_ids.into_iter().collect()
        };
        self.answers.insert(
            question.id,
            Answer {
                question_id: question.id,
                selected_option_ids: Some(selected),
                text_answer: None,
            },
        );
        Ok(())
    }

    /// Stores free text for a text-answer or essay question, replacing any
    /// previously stored selection.
    pub fn set_text(&mut self, question: &Question, text: String) -> Result<()> {
        if !question.question_type.is_free_text() {
            return Err(Error::InvalidQuestionType {
                question_id: question.id,
                question_type: question.question_type,
            });
        }
        self.answers.insert(
            question.id,
            Answer {
                question_id: question.id,
                selected_option_ids: None,
                text_answer: Some(text),
            },
        );
        Ok(())
    }

    pub fn get(&self, question_id: Uuid) -> Option<&Answer> {
        self.answers.get(&question_id)
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}
