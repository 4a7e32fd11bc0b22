//! Shared helpers for integration tests.

use std::time::{Duration, Instant};

use netlink_breaker::RateCircuitBreaker;

/// Build a breaker with the default smoothing factor.
pub fn new_test_breaker(max_events_per_sec: u64) -> RateCircuitBreaker {
    RateCircuitBreaker::new(max_events_per_sec as f64).unwrap()
}

/// Drive `breaker` with `count` events per one-second interval for `secs`
/// seconds starting at `now`. Returns the timestamp after the last interval.
pub fn drive(
    breaker: &mut RateCircuitBreaker,
    mut now: Instant,
    count: u64,
    secs: u64,
) -> Instant {
    let deadline = now + Duration::from_secs(secs);
    while now < deadline {
        breaker.tick(count);
        breaker.update(now);
        now += Duration::from_secs(1);
    }
    now
}
