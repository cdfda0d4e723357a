use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::attempt::{Attempt, AttemptState, GradedAnswer, SubmitTrigger};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecordAnswerRequest {
    pub question_id: Uuid,
    pub selected_option_ids: Option<Vec<Uuid>>,
    pub text_answer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordAnswerResponse {
    pub saved: bool,
    pub question_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerView {
    pub question_id: Uuid,
    pub selected_option_ids: Option<Vec<Uuid>>,
    pub text_answer: Option<String>,
}

/// Learner-facing attempt projection. Carries everything needed to resume
/// an in-progress attempt or render a terminal result, and never the
/// question snapshot with its answer keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptView {
    pub id: Uuid,
    pub learner_id: Uuid,
    pub test_id: Uuid,
    pub state: AttemptState,
    pub started_at: DateTime<Utc>,
    pub deadline: Option<DateTime<Utc>>,
    pub answers: Vec<AnswerView>,
    pub total_score: Option<i32>,
    pub max_score: i32,
    pub is_graded: bool,
    pub is_passed: Option<bool>,
    pub graded_answers: Option<Vec<GradedAnswer>>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub submit_trigger: Option<SubmitTrigger>,
}

impl From<&Attempt> for AttemptView {
    fn from(attempt: &Attempt) -> Self {
        // Walk the snapshot so the answer list keeps question order.
        let answers = attempt
            .questions
            .iter()
            .filter_map(|q| attempt.answers.get(q.id))
            .map(|a| AnswerView {
                question_id: a.question_id,
                selected_option_ids: a
                    .selected_option_ids
                    .as_ref()
                    .map(|ids| ids.iter().copied().collect()),
                text_answer: a.text_answer.clone(),
            })
            .collect();

        Self {
            id: attempt.id,
            learner_id: attempt.learner_id,
            test_id: attempt.test_id,
            state: attempt.state,
            started_at: attempt.started_at,
            deadline: attempt.deadline,
            answers,
            total_score: attempt.total_score,
            max_score: attempt.max_score,
            is_graded: attempt.is_graded,
            is_passed: attempt.is_passed,
            graded_answers: attempt.graded_answers.clone(),
            submitted_at: attempt.submitted_at,
            submit_trigger: attempt.submit_trigger,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptStatusResponse {
    pub state: AttemptState,
    pub started_at: DateTime<Utc>,
    pub deadline: Option<DateTime<Utc>>,
    pub time_remaining_seconds: Option<i64>,
    pub questions_answered: usize,
    pub total_questions: usize,
}
