use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use uuid::Uuid;

use crate::models::attempt::Attempt;

/// Handle to one stored attempt. The inner mutex is the per-attempt writer
/// lock: operations on the same attempt serialize, independent attempts
/// proceed in parallel.
pub type SharedAttempt = Arc<Mutex<Attempt>>;

/// In-process attempt storage. Attempts are inserted at `begin` and kept
/// across the active-to-terminal transition; the engine never deletes them.
#[derive(Default)]
pub struct AttemptStore {
    inner: RwLock<HashMap<Uuid, SharedAttempt>>,
}

impl AttemptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, attempt: Attempt) -> SharedAttempt {
        let id = attempt.id;
        let shared = Arc::new(Mutex::new(attempt));
        self.inner
            .write()
            .expect("attempt store lock poisoned")
            .insert(id, Arc::clone(&shared));
        shared
    }

    pub fn get(&self, id: Uuid) -> Option<SharedAttempt> {
        self.inner
            .read()
            .expect("attempt store lock poisoned")
            .get(&id)
            .cloned()
    }

    /// Rollback for a `begin` that lost the activation race.
    pub fn remove(&self, id: Uuid) {
        self.inner
            .write()
            .expect("attempt store lock poisoned")
            .remove(&id);
    }
}
