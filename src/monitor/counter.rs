//! Producer-side handle for recording events.

use crate::breaker::SharedBreaker;
use crate::observability::metrics;

/// Cloneable handle given to event producers.
#[derive(Debug, Clone)]
pub struct EventCounter {
    breaker: SharedBreaker,
}

impl EventCounter {
    pub fn new(breaker: SharedBreaker) -> Self {
        Self { breaker }
    }

    /// Record `count` events observed since the last call.
    pub fn record(&self, count: u64) {
        if count == 0 {
            return;
        }
        self.breaker.tick(count);
        metrics::record_events(count);
    }

    /// Whether the producer should shed load.
    pub fn is_open(&self) -> bool {
        self.breaker.is_open()
    }
}
