use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Millisecond wall clock that never goes backwards within the process.
///
/// Two calls may return the same instant; callers that need a total order
/// break ties by insertion sequence.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last_millis: AtomicI64,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> DateTime<Utc> {
        let wall = Utc::now().timestamp_millis();
        let previous = self.last_millis.fetch_max(wall, Ordering::SeqCst);
        let millis = previous.max(wall);
        // Every i64 produced by timestamp_millis() converts back
        DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now)
    }

    /// Pretend the clock has already reached `millis` (used to simulate a
    /// wall clock stepping backwards).
    #[cfg(test)]
    pub fn advance_to(&self, millis: i64) {
        self.last_millis.fetch_max(millis, Ordering::SeqCst);
    }
}
