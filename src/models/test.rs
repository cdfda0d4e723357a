use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::question::Question;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestDefinition {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub questions: Vec<Question>,
    /// Zero means untimed.
    pub duration_minutes: i32,
    /// Percentage of the maximum score required to pass.
    pub pass_threshold: f64,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl TestDefinition {
    pub fn is_timed(&self) -> bool {
        self.duration_minutes > 0
    }

    pub fn max_score(&self) -> i32 {
        self.questions.iter().map(|q| q.points).sum()
    }
}
