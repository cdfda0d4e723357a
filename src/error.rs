use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;
use uuid::Uuid;

use crate::dto::attempt_dto::AttemptView;
use crate::models::question::QuestionType;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("An attempt at this test is already in progress")]
    AttemptAlreadyActive { attempt: Box<AttemptView> },

    #[error("This test already has a completed attempt")]
    AttemptAlreadyCompleted { attempt: Box<AttemptView> },

    #[error("Attempt not found")]
    AttemptNotFound,

    #[error("Attempt belongs to another learner")]
    NotOwner,

    #[error("Attempt is no longer accepting changes")]
    AttemptNotMutable,

    #[error("Question {question_id} does not take this answer payload ({question_type:?})")]
    InvalidQuestionType {
        question_id: Uuid,
        question_type: QuestionType,
    },

    #[error("No completed attempt for this test")]
    NoCompletedAttempt,

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let message = self.to_string();
        let (status, code, attempt) = match self {
            Error::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request", None),
            Error::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            Error::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", None),
            Error::Validation(_) => (StatusCode::BAD_REQUEST, "validation_failed", None),
            Error::Json(_) => (StatusCode::BAD_REQUEST, "invalid_json", None),
            Error::AttemptAlreadyActive { attempt } => {
                (StatusCode::CONFLICT, "attempt_already_active", Some(attempt))
            }
            Error::AttemptAlreadyCompleted { attempt } => (
                StatusCode::CONFLICT,
                "attempt_already_completed",
                Some(attempt),
            ),
            Error::AttemptNotFound => (StatusCode::NOT_FOUND, "attempt_not_found", None),
            Error::NotOwner => (StatusCode::FORBIDDEN, "not_owner", None),
            Error::AttemptNotMutable => (StatusCode::CONFLICT, "attempt_not_mutable", None),
            Error::InvalidQuestionType { .. } => {
                (StatusCode::BAD_REQUEST, "invalid_question_type", None)
            }
            Error::NoCompletedAttempt => (StatusCode::NOT_FOUND, "no_completed_attempt", None),
            Error::Config(_) | Error::Internal(_) | Error::Io(_) | Error::Anyhow(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                None,
            ),
        };

        let mut body = json!({ "error": code, "message": message });
        if let Some(attempt) = attempt {
            body["attempt"] = serde_json::to_value(*attempt).unwrap_or(serde_json::Value::Null);
        }
        (status, Json(body)).into_response()
    }
}
