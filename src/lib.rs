pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod utils;

use std::sync::Arc;

use crate::services::attempt_registry::AttemptRegistry;
use crate::services::attempt_service::AttemptService;
use crate::services::deadline_scheduler::DeadlineScheduler;
use crate::services::test_service::TestService;
use crate::store::attempts::AttemptStore;

#[derive(Clone)]
pub struct AppState {
    pub test_service: Arc<TestService>,
    pub attempt_service: AttemptService,
}

impl AppState {
    /// Wires the engine together and spawns the forced-submit worker that
    /// drains deadline fires. Must run inside a tokio runtime.
    pub fn new() -> Self {
        let store = Arc::new(AttemptStore::new());
        let registry = Arc::new(AttemptRegistry::new());
        let test_service = Arc::new(TestService::new());
        let (scheduler, mut due_rx) = DeadlineScheduler::new();
        let attempt_service = AttemptService::new(
            store,
            registry,
            Arc::clone(&test_service),
            scheduler,
        );

        {
            let service = attempt_service.clone();
            tokio::spawn(async move {
                while let Some(attempt_id) = due_rx.recv().await {
                    match service.force_submit(attempt_id) {
                        Ok(view) => tracing::info!(
                            attempt_id = %attempt_id,
                            total_score = ?view.total_score,
                            "deadline submission"
                        ),
                        Err(e) => tracing::error!(
                            attempt_id = %attempt_id,
                            error = ?e,
                            "deadline submission failed"
                        ),
                    }
                }
            });
        }

        Self {
            test_service,
            attempt_service,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
