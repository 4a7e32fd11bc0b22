//! Shareable breaker handle.
//!
//! The core breaker is single-owner. When a producer task and a monitor task
//! both need it, every call goes through one mutex.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::breaker::rate::{BreakerState, RateCircuitBreaker, Transition};

/// Snapshot of breaker state taken under a single lock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakerSnapshot {
    pub state: BreakerState,
    pub rate: f64,
    pub pending_ticks: u64,
    pub max_events_per_sec: f64,
}

impl BreakerSnapshot {
    fn of(breaker: &RateCircuitBreaker) -> Self {
        Self {
            state: breaker.state(),
            rate: breaker.rate(),
            pending_ticks: breaker.pending_ticks(),
            max_events_per_sec: breaker.max_events_per_sec(),
        }
    }
}

/// Breaker reference shared across tasks.
#[derive(Debug, Clone)]
pub struct SharedBreaker {
    inner: Arc<Mutex<RateCircuitBreaker>>,
}

impl SharedBreaker {
    pub fn new(breaker: RateCircuitBreaker) -> Self {
        Self {
            inner: Arc::new(Mutex::new(breaker)),
        }
    }

    // Breaker state is consistent between calls, so a poisoned lock is safe to reuse.
    fn lock(&self) -> MutexGuard<'_, RateCircuitBreaker> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn tick(&self, count: u64) {
        self.lock().tick(count);
    }

    pub fn update(&self, now: Instant) -> Transition {
        self.lock().update(now)
    }

    pub fn is_open(&self) -> bool {
        self.lock().is_open()
    }

    pub fn reset(&self) {
        self.lock().reset();
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        BreakerSnapshot::of(&self.lock())
    }

    /// Close an interval and capture the resulting state under one lock.
    ///
    /// With `reset_on_trip`, a trip re-arms the breaker before the lock is
    /// released. The snapshot still shows the tripped state.
    pub fn update_snapshot(
        &self,
        now: Instant,
        reset_on_trip: bool,
    ) -> (Transition, BreakerSnapshot) {
        let mut breaker = self.lock();
        let transition = breaker.update(now);
        let snapshot = BreakerSnapshot::of(&breaker);
        if reset_on_trip && transition == Transition::Tripped {
            breaker.reset();
        }
        (transition, snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_concurrent_ticks() {
        let shared = SharedBreaker::new(RateCircuitBreaker::new(100.0).unwrap());
        let mut handles = vec![];

        for _ in 0..10 {
            let shared = shared.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    shared.tick(1);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(shared.snapshot().pending_ticks, 1000);
        assert_eq!(shared.update(Instant::now()), Transition::Tripped);
        assert!(shared.is_open());
    }

    #[test]
    fn test_clones_share_state() {
        let a = SharedBreaker::new(RateCircuitBreaker::new(100.0).unwrap());
        let b = a.clone();

        a.tick(500);
        b.update(Instant::now());
        assert!(a.is_open());

        b.reset();
        assert!(!a.is_open());
        assert_eq!(a.snapshot().rate, 0.0);
    }

    #[test]
    fn test_update_snapshot_reports_trip_before_reset() {
        let shared = SharedBreaker::new(RateCircuitBreaker::new(100.0).unwrap());
        shared.tick(500);

        let (transition, snapshot) = shared.update_snapshot(Instant::now(), true);
        assert_eq!(transition, Transition::Tripped);
        assert_eq!(snapshot.state, BreakerState::Open);
        assert_eq!(snapshot.rate, 500.0);
        assert_eq!(snapshot.pending_ticks, 0);
        assert!(!shared.is_open());

        // Events recorded after the combined update are kept
        shared.tick(3);
        assert_eq!(shared.snapshot().pending_ticks, 3);
    }

    #[test]
    fn test_update_snapshot_without_reset_stays_open() {
        let shared = SharedBreaker::new(RateCircuitBreaker::new(100.0).unwrap());
        shared.tick(500);

        let (transition, snapshot) = shared.update_snapshot(Instant::now(), false);
        assert_eq!(transition, Transition::Tripped);
        assert_eq!(snapshot.state, BreakerState::Open);
        assert!(shared.is_open());
    }
}
