use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

/// Fixed-window request limiter. The window index and counter race under
/// load, which can let a handful of extra requests through at a window
/// edge; that slack is acceptable for an abuse brake.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    rps: u32,
    epoch: Instant,
    window: Arc<AtomicU64>,
    count: Arc<AtomicU32>,
}

impl RateLimiter {
    fn new(rps: u32) -> Self {
        Self {
            rps: rps.max(1),
            epoch: Instant::now(),
            window: Arc::new(AtomicU64::new(0)),
            count: Arc::new(AtomicU32::new(0)),
        }
    }

    fn allow(&self) -> bool {
        let current = self.epoch.elapsed().as_secs();
        if self.window.swap(current, Ordering::Relaxed) != current {
            self.count.store(0, Ordering::Relaxed);
        }
        self.count.fetch_add(1, Ordering::Relaxed) < self.rps
    }
}

pub async fn rps_middleware(
    State(state): State<RateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !state.allow() {
        return (StatusCode::TOO_MANY_REQUESTS, "rate_limit_exceeded").into_response();
    }
    next.run(req).await
}

pub fn new_rps_state(rps: u32) -> RateLimiter {
    RateLimiter::new(rps)
}
