use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};
use elearning_backend::{
    config::{get_config, init_config},
    routes, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let app_state = AppState::new();

    let base_routes = Router::new().route("/health", get(routes::health::health));

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
        ))
        .layer(axum::middleware::from_fn_with_state(
            elearning_backend::middleware::rate_limit::new_rps_state(config.public_rps),
            elearning_backend::middleware::rate_limit::rps_middleware,
        ));

    let integration_api = Router::new()
        .route(
            "/api/integration/tests",
            post(routes::tests::create_test),
        )
        .route(
            "/api/integration/tests/:id",
            get(routes::tests::get_test),
        )
        .layer(axum::middleware::from_fn(
            elearning_backend::middleware::auth::require_staff,
        ))
        .layer(axum::middleware::from_fn_with_state(
            elearning_backend::middleware::rate_limit::new_rps_state(config.integration_rps),
            elearning_backend::middleware::rate_limit::rps_middleware,
        ));

    let app = base_routes
        .merge(learner_api)
        .merge(integration_api)
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
