use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Receiving half of the deadline channel, drained by the forced-submit
/// worker spawned in `AppState::new`.
pub type DeadlineRx = mpsc::UnboundedReceiver<Uuid>;

/// One timer task per timed in-progress attempt. When a timer elapses it
/// pushes the attempt id onto the channel; delivery is fire-and-forget
/// because `submit` is idempotent and absorbs a racing explicit submission.
#[derive(Clone)]
pub struct DeadlineScheduler {
    due_tx: mpsc::UnboundedSender<Uuid>,
    timers: Arc<Mutex<HashMap<Uuid, JoinHandle<()>>>>,
}

impl DeadlineScheduler {
    pub fn new() -> (Self, DeadlineRx) {
        let (due_tx, due_rx) = mpsc::unbounded_channel();
        (
            Self {
                due_tx,
                timers: Arc::new(Mutex::new(HashMap::new())),
            },
            due_rx,
        )
    }

    /// Arms a timer for the attempt. Re-arming an armed attempt is a no-op.
    /// An already-elapsed deadline fires immediately.
    pub fn arm(&self, attempt_id: Uuid, deadline: DateTime<Utc>) {
        let mut timers = self.timers.lock().expect("scheduler lock poisoned");
        if timers.contains_key(&attempt_id) {
            return;
        }

        let delay = (deadline - Utc::now()).to_std().unwrap_or_default();
        let due_tx = self.due_tx.clone();
        let registry = Arc::clone(&self.timers);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            registry
                .lock()
                .expect("scheduler lock poisoned")
                .remove(&attempt_id);
            if due_tx.send(attempt_id).is_err() {
                tracing::warn!(attempt_id = %attempt_id, "deadline fired but worker is gone");
            }
        });
        timers.insert(attempt_id, handle);
    }

    /// Disarms the attempt's timer. No-op if it already fired or was never
    /// armed.
    pub fn cancel(&self, attempt_id: Uuid) {
        let handle = self
            .timers
            .lock()
            .expect("scheduler lock poisoned")
            .remove(&attempt_id);
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}
