use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::answer::AnswerSet;
use crate::models::question::Question;
use crate::models::test::TestDefinition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptState {
    InProgress,
    Submitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitTrigger {
    Explicit,
    Deadline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreOutcome {
    Correct,
    Incorrect,
    PendingManualGrade,
}

/// Per-question scoring row stored on the terminal attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradedAnswer {
    pub question_id: Uuid,
    pub points_earned: i32,
    pub max_points: i32,
    pub outcome: ScoreOutcome,
}

/// One learner's run at one test. Holds the question snapshot taken at
/// creation, so later catalog changes never affect a running attempt.
///
/// Deliberately not `Serialize`: the snapshot carries answer keys, and
/// everything leaving the engine goes through a view DTO.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub id: Uuid,
    pub learner_id: Uuid,
    pub test_id: Uuid,
    pub state: AttemptState,
    pub started_at: DateTime<Utc>,
    pub deadline: Option<DateTime<Utc>>,
    pub questions: Vec<Question>,
    pub pass_threshold: f64,
    pub answers: AnswerSet,
    /// Sum of all snapshot point values, fixed at creation.
    pub max_score: i32,
    pub total_score: Option<i32>,
    pub is_graded: bool,
    /// Meaningful only once `is_graded` is true; `None` until then.
    pub is_passed: Option<bool>,
    pub graded_answers: Option<Vec<GradedAnswer>>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub submit_trigger: Option<SubmitTrigger>,
}

impl Attempt {
    pub fn new(id: Uuid, learner_id: Uuid, test: &TestDefinition, now: DateTime<Utc>) -> Self {
        let deadline = if test.is_timed() {
            Some(now + Duration::minutes(test.duration_minutes as i64))
        } else {
            None
        };
        Self {
            id,
            learner_id,
            test_id: test.id,
            state: AttemptState::InProgress,
            started_at: now,
            deadline,
            questions: test.questions.clone(),
            pass_threshold: test.pass_threshold,
            answers: AnswerSet::new(),
            max_score: test.max_score(),
            total_score: None,
            is_graded: false,
            is_passed: None,
            graded_answers: None,
            submitted_at: None,
            submit_trigger: None,
        }
    }

    pub fn is_mutable(&self) -> bool {
        self.state == AttemptState::InProgress
    }

    pub fn question(&self, question_id: Uuid) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }
}
