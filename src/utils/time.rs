use chrono::{DateTime, Utc};

/// Whole seconds from now until `deadline`, clamped at zero.
pub fn seconds_until(deadline: DateTime<Utc>) -> i64 {
    (deadline - Utc::now()).num_seconds().max(0)
}
