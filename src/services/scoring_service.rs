use std::collections::BTreeSet;

use uuid::Uuid;

use crate::models::answer::{Answer, AnswerSet};
use crate::models::attempt::{GradedAnswer, ScoreOutcome};
use crate::models::question::{Question, QuestionDetails, QuestionType};

pub struct ScoringService;

#[derive(Debug, Clone)]
pub struct AttemptScore {
    pub total_score: i32,
    pub max_score: i32,
    pub graded: Vec<GradedAnswer>,
    /// False while any question awaits manual grading.
    pub fully_graded: bool,
}

impl ScoringService {
    /// Scores every question of the snapshot against the answer set.
    /// Pure: identical inputs always produce identical output.
    pub fn score_attempt(questions: &[Question], answers: &AnswerSet) -> AttemptScore {
        let mut total_score = 0;
        let mut max_score = 0;
        let mut graded = Vec::with_capacity(questions.len());
        let mut fully_graded = true;

        for question in questions {
            max_score += question.points;
            let row = Self::score_question(question, answers.get(question.id));
            if row.outcome == ScoreOutcome::PendingManualGrade {
                fully_graded = false;
            }
            total_score += row.points_earned;
            graded.push(row);
        }

        AttemptScore {
            total_score,
            max_score,
            graded,
            fully_graded,
        }
    }

    /// Choice questions earn full points only on an exact, order-independent
    /// match with the key; text answers compare trimmed and case-folded;
    /// essays always report pending. Missing answers score zero.
    pub fn score_question(question: &Question, answer: Option<&Answer>) -> GradedAnswer {
        let outcome = match (question.question_type, &question.details) {
            (QuestionType::Essay, _) => ScoreOutcome::PendingManualGrade,
            (_, QuestionDetails::Choice(details)) => {
                let key: BTreeSet<Uuid> = details.correct_option_ids.iter().copied().collect();
                match answer.and_then(|a| a.selected_option_ids.as_ref()) {
                    Some(selected) if *selected == key => ScoreOutcome::Correct,
                    _ => ScoreOutcome::Incorrect,
                }
            }
            (_, QuestionDetails::TextAnswer(details)) => {
                let expected = details.expected_answer.trim().to_lowercase();
                match answer.and_then(|a| a.text_answer.as_deref()) {
                    Some(given) if given.trim().to_lowercase() == expected => {
                        ScoreOutcome::Correct
                    }
                    _ => ScoreOutcome::Incorrect,
                }
            }
            // A payload that does not match the question type never earns points.
            _ => ScoreOutcome::Incorrect,
        };

        let points_earned = if outcome == ScoreOutcome::Correct {
            question.points
        } else {
            0
        };

        GradedAnswer {
            question_id: question.id,
            points_earned,
            max_points: question.points,
            outcome,
        }
    }
}
