//! Injectable wall clock.

use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Source of "now" for backoff decisions and sync markers.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// The real clock.
#[must_use]
pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// A clock frozen at `at`.
#[must_use]
pub fn fixed_clock(at: DateTime<Utc>) -> Clock {
    Arc::new(move || at)
}
