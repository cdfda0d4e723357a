use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::test_dto::{CreateTestRequest, QuestionView, TestSummaryView};
use crate::error::Result;
use crate::middleware::auth::Claims;
use crate::AppState;

#[utoipa::path(
    post,
    path = "/api/integration/tests",
    request_body = CreateTestRequest,
    responses(
        (status = 201, description = "Test registered", body = TestDefinition),
        (status = 400, description = "Invalid test definition"),
        (status = 403, description = "Caller is not staff"),
    ),
)]
pub async fn create_test(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateTestRequest>,
) -> Result<Response> {
    payload.validate()?;
    let created_by = claims.sub.parse::<Uuid>().ok();
    let test = state.test_service.create_test(payload, created_by)?;
    Ok((StatusCode::CREATED, Json(test)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/integration/tests/{id}",
    params(
        ("id" = Uuid, Path, description = "Test ID")
    ),
    responses(
        (status = 200, description = "Full definition including answer keys", body = TestDefinition),
        (status = 404, description = "Test not found"),
    ),
)]
pub async fn get_test(
    State(state): State<AppState>,
    Path(test_id): Path<Uuid>,
) -> Result<Response> {
    let test = state.test_service.get_test_by_id(test_id)?;
    Ok(Json(test).into_response())
}

#[axum::debug_handler]
pub async fn get_test_summary(
    State(state): State<AppState>,
    Path(test_id): Path<Uuid>,
) -> Result<Response> {
    let test = state.test_service.get_test_by_id(test_id)?;
    Ok(Json(TestSummaryView::from(&test)).into_response())
}

#[axum::debug_handler]
pub async fn get_test_questions(
    State(state): State<AppState>,
    Path(test_id): Path<Uuid>,
) -> Result<Response> {
    let test = state.test_service.get_test_by_id(test_id)?;
    let questions: Vec<QuestionView> = test.questions.iter().map(QuestionView::from).collect();
    Ok(Json(questions).into_response())
}
