use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

#[derive(Debug, Default)]
struct PairSlot {
    active: Option<Uuid>,
    terminal: Option<Uuid>,
}

/// Why `try_activate` refused to register a new attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationConflict {
    /// The pair already has an in-progress attempt.
    Active(Uuid),
    /// The pair already has a terminal attempt.
    Completed(Uuid),
}

/// Source of truth for which (learner, test) pairs hold an active attempt
/// and which hold a terminal result. All checks run under one short-lived
/// lock, which is what makes concurrent `begin` calls race safely.
#[derive(Default)]
pub struct AttemptRegistry {
    pairs: Mutex<HashMap<(Uuid, Uuid), PairSlot>>,
}

impl AttemptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomic check-and-set: registers `attempt_id` as the pair's active
    /// attempt unless the pair already holds an active or terminal one.
    pub fn try_activate(
        &self,
        learner_id: Uuid,
        test_id: Uuid,
        attempt_id: Uuid,
    ) -> std::result::Result<(), ActivationConflict> {
        let mut pairs = self.pairs.lock().expect("registry lock poisoned");
        let slot = pairs.entry((learner_id, test_id)).or_default();
        if let Some(active) = slot.active {
            return Err(ActivationConflict::Active(active));
        }
        if let Some(terminal) = slot.terminal {
            return Err(ActivationConflict::Completed(terminal));
        }
        slot.active = Some(attempt_id);
        Ok(())
    }

    /// Moves the pair's attempt from the active to the terminal index.
    /// Called only from `submit`, once per attempt.
    pub fn deactivate(&self, learner_id: Uuid, test_id: Uuid, attempt_id: Uuid) {
        let mut pairs = self.pairs.lock().expect("registry lock poisoned");
        if let Some(slot) = pairs.get_mut(&(learner_id, test_id)) {
            if slot.active == Some(attempt_id) {
                slot.active = None;
                slot.terminal = Some(attempt_id);
            }
        }
    }

    pub fn lookup_terminal(&self, learner_id: Uuid, test_id: Uuid) -> Option<Uuid> {
        self.pairs
            .lock()
            .expect("registry lock poisoned")
            .get(&(learner_id, test_id))
            .and_then(|slot| slot.terminal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn second_activation_conflicts() {
        let registry = AttemptRegistry::new();
        let (learner, test) = (Uuid::new_v4(), Uuid::new_v4());
        let first = Uuid::new_v4();

        registry.try_activate(learner, test, first).unwrap();
        assert_eq!(
            registry.try_activate(learner, test, Uuid::new_v4()),
            Err(ActivationConflict::Active(first))
        );
    }

    #[test]
    fn deactivate_moves_attempt_to_terminal_index() {
        let registry = AttemptRegistry::new();
        let (learner, test) = (Uuid::new_v4(), Uuid::new_v4());
        let attempt = Uuid::new_v4();

        registry.try_activate(learner, test, attempt).unwrap();
        assert_eq!(registry.lookup_terminal(learner, test), None);

        registry.deactivate(learner, test, attempt);
        assert_eq!(registry.lookup_terminal(learner, test), Some(attempt));
        assert_eq!(
            registry.try_activate(learner, test, Uuid::new_v4()),
            Err(ActivationConflict::Completed(attempt))
        );
    }

    #[test]
    fn parallel_activation_admits_exactly_one() {
        let registry = Arc::new(AttemptRegistry::new());
        let (learner, test) = (Uuid::new_v4(), Uuid::new_v4());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    registry.try_activate(learner, test, Uuid::new_v4()).is_ok()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&ok| ok)
            .count();
        assert_eq!(winners, 1);
    }

    #[test]
    fn distinct_pairs_do_not_interfere() {
        let registry = AttemptRegistry::new();
        let learner = Uuid::new_v4();
        let (test_a, test_b) = (Uuid::new_v4(), Uuid::new_v4());

        registry.try_activate(learner, test_a, Uuid::new_v4()).unwrap();
        registry.try_activate(learner, test_b, Uuid::new_v4()).unwrap();
    }
}
