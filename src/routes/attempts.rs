use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::attempt_dto::{RecordAnswerRequest, RecordAnswerResponse};
use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::AppState;

fn learner_id(claims: &Claims) -> Result<Uuid> {
    claims
        .sub
        .parse()
        .map_err(|_| Error::Unauthorized("Subject claim is not a learner id".to_string()))
}

#[axum::debug_handler]
pub async fn start_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(test_id): Path<Uuid>,
) -> Result<Response> {
    let learner = learner_id(&claims)?;
    let view = state.attempt_service.begin(learner, test_id)?;
    Ok((StatusCode::CREATED, Json(view)).into_response())
}

#[axum::debug_handler]
pub async fn record_answer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(attempt_id): Path<Uuid>,
    Json(req): Json<RecordAnswerRequest>,
) -> Result<Response> {
    req.validate()?;
    let learner = learner_id(&claims)?;
    let question_id = req.question_id;
    let timestamp = state
        .attempt_service
        .record_answer(attempt_id, learner, req)?;
    Ok(Json(RecordAnswerResponse {
        saved: true,
        question_id,
        timestamp,
    })
    .into_response())
}

#[axum::debug_handler]
pub async fn submit_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(attempt_id): Path<Uuid>,
) -> Result<Response> {
    let learner = learner_id(&claims)?;
    let view = state.attempt_service.submit(attempt_id, learner)?;
    Ok(Json(view).into_response())
}

#[axum::debug_handler]
pub async fn attempt_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(attempt_id): Path<Uuid>,
) -> Result<Response> {
    let learner = learner_id(&claims)?;
    let status = state.attempt_service.status(attempt_id, learner)?;
    Ok(Json(status).into_response())
}

#[axum::debug_handler]
pub async fn latest_completed(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(test_id): Path<Uuid>,
) -> Result<Response> {
    let learner = learner_id(&claims)?;
    let view = state.attempt_service.completed_result(learner, test_id)?;
    Ok(Json(view).into_response())
}
