use std::env;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    routing::{get, patch, post},
    Router,
};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use uuid::Uuid;

use elearning_backend::middleware::auth::Claims;
use elearning_backend::{routes, AppState};

const JWT_SECRET: &str = "test_secret_key";

fn init_test_config() {
    env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    env::set_var("JWT_SECRET", JWT_SECRET);
    env::set_var("PUBLIC_RPS", "1000");
    env::set_var("INTEGRATION_RPS", "1000");
    let _ = elearning_backend::config::init_config();
}

fn bearer_token(subject: &str, role: &str) -> String {
    let claims = Claims {
        sub: subject.to_string(),
        exp: (Utc::now().timestamp() + 3600) as usize,
        role: Some(role.to_string()),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("encode jwt");
    format!("Bearer {}", token)
}

fn build_app(state: AppState) -> Router {
    let learner_api = Router::new()
        .route("/api/tests/:id", get(routes::tests::get_test_summary))
        .route(
            "/api/tests/:id/questions",
            get(routes::tests::get_test_questions),
        )
        .route(
            "/api/attempts/start/:test_id",
            post(routes::attempts::start_attempt),
        )
        .route(
            "/api/attempts/:id/answer",
            patch(routes::attempts::record_answer),
        )
        .route(
            "/api/attempts/:id/submit",
            post(routes::attempts::submit_attempt),
        )
        .route(
            "/api/attempts/:id/status",
            get(routes::attempts::attempt_status),
        )
        .route(
            "/api/attempts/test/:test_id/latest-completed",
            get(routes::attempts::latest_completed),
        )
        .layer(axum::middleware::from_fn(
            elearning_backend::middleware::auth::require_bearer_auth,
        ));

    let integration_api = Router::new()
        .route("/api/integration/tests", post(routes::tests::create_test))
        .route(
            "/api/integration/tests/:id",
            get(routes::tests::get_test),
        )
        .layer(axum::middleware::from_fn(
            elearning_backend::middleware::auth::require_staff,
        ));

    Router::new()
        .route("/health", get(routes::health::health))
        .merge(learner_api)
        .merge(integration_api)
        .with_state(state)
}

async fn json_body(resp: axum::response::Response) -> JsonValue {
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn register_sample_test(app: &Router, staff_token: &str) -> JsonValue {
    let payload = json!({
        "title": "Workplace safety",
        "description": "Two-question safety check",
        "duration_minutes": 10,
        "pass_threshold": 70.0,
        "questions": [
            {
                "type": "single_choice",
                "text": "Which extinguisher class covers electrical fires?",
                "points": 5,
                "options": ["Class A", "Class C", "Class K"],
                "correct_options": [1]
            },
            {
                "type": "single_choice",
                "text": "Who signs off a hot-work permit?",
                "points": 5,
                "options": ["Any colleague", "The shift supervisor"],
                "correct_options": [1]
            }
        ]
    });
    let req = Request::builder()
        .method("POST")
        .uri("/api/integration/tests")
        .header("authorization", staff_token)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    json_body(resp).await
}

fn option_ids(question: &JsonValue) -> Vec<String> {
    question["options"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn learner_flow_end_to_end() {
    init_test_config();
    let app = build_app(AppState::new());

    let learner = Uuid::new_v4();
    let learner_token = bearer_token(&learner.to_string(), "student");
    let staff_token = bearer_token(&Uuid::new_v4().to_string(), "instructor");

    let test = register_sample_test(&app, &staff_token).await;
    let test_id = test["id"].as_str().unwrap();
    let questions = test["questions"].as_array().unwrap();

    let q1 = &questions[0];
    let q2 = &questions[1];
    let q1_correct = q1["correct_option_ids"][0].as_str().unwrap();
    let q2_options = option_ids(q2);
    let q2_correct = q2["correct_option_ids"][0].as_str().unwrap();
    let q2_wrong = q2_options
        .iter()
        .find(|id| id.as_str() != q2_correct)
        .unwrap();

    // The learner-facing question view must not leak the key.
    let req = Request::builder()
        .method("GET")
        .uri(format!("/api/tests/{}/questions", test_id))
        .header("authorization", &learner_token)
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(!text.contains("correct_option_ids"));
    assert!(!text.contains("expected_answer"));

    // Start the attempt.
    let req = Request::builder()
        .method("POST")
        .uri(format!("/api/attempts/start/{}", test_id))
        .header("authorization", &learner_token)
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let attempt = json_body(resp).await;
    let attempt_id = attempt["id"].as_str().unwrap().to_string();
    assert_eq!(attempt["state"], "in_progress");
    assert!(attempt["deadline"].is_string());
    assert_eq!(attempt["max_score"], 10);

    // Answer question 1 correctly, question 2 incorrectly.
    for (question, choice) in [(q1, q1_correct), (q2, q2_wrong.as_str())] {
        let body = json!({
            "question_id": question["id"],
            "selected_option_ids": [choice]
        });
        let req = Request::builder()
            .method("PATCH")
            .uri(format!("/api/attempts/{}/answer", attempt_id))
            .header("authorization", &learner_token)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let saved = json_body(resp).await;
        assert_eq!(saved["saved"], true);
    }

    // Progress is visible before submission.
    let req = Request::builder()
        .method("GET")
        .uri(format!("/api/attempts/{}/status", attempt_id))
        .header("authorization", &learner_token)
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let status = json_body(resp).await;
    assert_eq!(status["state"], "in_progress");
    assert_eq!(status["questions_answered"], 2);
    assert_eq!(status["total_questions"], 2);
    assert!(status["time_remaining_seconds"].as_i64().unwrap() > 0);

    // Submit and check the scored result: 5/10 is below the 70% threshold.
    let req = Request::builder()
        .method("POST")
        .uri(format!("/api/attempts/{}/submit", attempt_id))
        .header("authorization", &learner_token)
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let result = json_body(resp).await;
    assert_eq!(result["state"], "submitted");
    assert_eq!(result["total_score"], 5);
    assert_eq!(result["max_score"], 10);
    assert_eq!(result["is_graded"], true);
    assert_eq!(result["is_passed"], false);
    assert_eq!(result["submit_trigger"], "explicit");

    // Submitting again is a no-op returning the same terminal result.
    let req = Request::builder()
        .method("POST")
        .uri(format!("/api/attempts/{}/submit", attempt_id))
        .header("authorization", &learner_token)
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let repeat = json_body(resp).await;
    assert_eq!(repeat["total_score"], result["total_score"]);
    assert_eq!(repeat["max_score"], result["max_score"]);
    assert_eq!(repeat["is_passed"], result["is_passed"]);
    assert_eq!(repeat["is_graded"], result["is_graded"]);
    assert_eq!(repeat["submitted_at"], result["submitted_at"]);

    // The terminal result is queryable without re-scoring.
    let req = Request::builder()
        .method("GET")
        .uri(format!("/api/attempts/test/{}/latest-completed", test_id))
        .header("authorization", &learner_token)
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let completed = json_body(resp).await;
    assert_eq!(completed["id"].as_str().unwrap(), attempt_id);
    assert_eq!(completed["total_score"], 5);

    // A fresh begin is refused and carries the prior terminal attempt.
    let req = Request::builder()
        .method("POST")
        .uri(format!("/api/attempts/start/{}", test_id))
        .header("authorization", &learner_token)
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let conflict = json_body(resp).await;
    assert_eq!(conflict["error"], "attempt_already_completed");
    assert_eq!(conflict["attempt"]["id"].as_str().unwrap(), attempt_id);
    assert_eq!(conflict["attempt"]["total_score"], 5);
}

#[tokio::test]
async fn begin_conflict_carries_resumable_attempt() {
    init_test_config();
    let app = build_app(AppState::new());

    let learner_token = bearer_token(&Uuid::new_v4().to_string(), "student");
    let staff_token = bearer_token(&Uuid::new_v4().to_string(), "instructor");

    let test = register_sample_test(&app, &staff_token).await;
    let test_id = test["id"].as_str().unwrap();
    let q1 = &test["questions"][0];
    let q1_correct = q1["correct_option_ids"][0].as_str().unwrap();

    let req = Request::builder()
        .method("POST")
        .uri(format!("/api/attempts/start/{}", test_id))
        .header("authorization", &learner_token)
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let attempt = json_body(resp).await;

    let body = json!({
        "question_id": q1["id"],
        "selected_option_ids": [q1_correct]
    });
    let req = Request::builder()
        .method("PATCH")
        .uri(format!("/api/attempts/{}/answer", attempt["id"].as_str().unwrap()))
        .header("authorization", &learner_token)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // A reload re-issues begin: the conflict payload must contain the
    // answers recorded so far so the client can resume.
    let req = Request::builder()
        .method("POST")
        .uri(format!("/api/attempts/start/{}", test_id))
        .header("authorization", &learner_token)
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let conflict = json_body(resp).await;
    assert_eq!(conflict["error"], "attempt_already_active");
    assert_eq!(conflict["attempt"]["state"], "in_progress");
    assert_eq!(conflict["attempt"]["answers"].as_array().unwrap().len(), 1);
    assert_eq!(
        conflict["attempt"]["answers"][0]["selected_option_ids"][0]
            .as_str()
            .unwrap(),
        q1_correct
    );
}

#[tokio::test]
async fn auth_is_enforced_on_both_surfaces() {
    init_test_config();
    let app = build_app(AppState::new());

    // No token at all.
    let req = Request::builder()
        .method("POST")
        .uri(format!("/api/attempts/start/{}", Uuid::new_v4()))
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // A learner token is not enough for the integration surface.
    let learner_token = bearer_token(&Uuid::new_v4().to_string(), "student");
    let req = Request::builder()
        .method("POST")
        .uri("/api/integration/tests")
        .header("authorization", &learner_token)
        .header("content-type", "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Unknown test id yields a clean 404 for an authenticated learner.
    let req = Request::builder()
        .method("GET")
        .uri(format!(
            "/api/attempts/test/{}/latest-completed",
            Uuid::new_v4()
        ))
        .header("authorization", &learner_token)
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = json_body(resp).await;
    assert_eq!(body["error"], "no_completed_attempt");
}
