//! EWMA-smoothed rate circuit breaker.
//!
//! # States
//! - Closed: event rate is sustainable, normal operation
//! - Open: smoothed rate exceeds the ceiling, source is flooding
//!
//! # State Transitions
//! ```text
//! Closed → Open: smoothed_rate > max_events_per_sec (on update)
//! Open → Closed: smoothed_rate <= max_events_per_sec (on update)
//! Any → Closed: reset()
//! ```

use std::time::Instant;

use serde::Serialize;
use thiserror::Error;

/// Defined in `config::schema` alongside the rest of the file format.
pub use crate::config::schema::BreakerConfig;

/// Errors raised when a breaker is built with an invalid configuration.
#[derive(Debug, Error, PartialEq)]
pub enum BreakerError {
    /// Ceiling must be a positive, finite number of events per second.
    #[error("max_events_per_sec must be positive and finite, got {0}")]
    InvalidCeiling(f64),

    /// Smoothing factor must lie in (0, 1].
    #[error("smoothing_factor must be in (0, 1], got {0}")]
    InvalidSmoothingFactor(f64),
}

/// Breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakerState {
    /// Rate is within the ceiling.
    Closed,
    /// Rate is above the ceiling, protective action warranted.
    Open,
}

impl BreakerState {
    fn from_open(open: bool) -> Self {
        if open {
            BreakerState::Open
        } else {
            BreakerState::Closed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BreakerState::Closed => "closed",
            BreakerState::Open => "open",
        }
    }
}

/// Edge observed by a single `update` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    Unchanged,
    /// Closed → Open
    Tripped,
    /// Open → Closed
    Recovered,
}

/// Circuit breaker driven by a smoothed events-per-second estimate.
#[derive(Debug, Clone)]
pub struct RateCircuitBreaker {
    max_events_per_sec: f64,
    smoothing_factor: f64,
    pending_ticks: u64,
    smoothed_rate: f64,
    last_update: Option<Instant>,
    open: bool,
    has_sample: bool,
}

impl RateCircuitBreaker {
    /// Create a breaker with the given ceiling and the default smoothing factor.
    pub fn new(max_events_per_sec: f64) -> Result<Self, BreakerError> {
        Self::with_config(BreakerConfig {
            max_events_per_sec,
            ..BreakerConfig::default()
        })
    }

    /// Create a breaker from a full configuration.
    pub fn with_config(config: BreakerConfig) -> Result<Self, BreakerError> {
        if !config.max_events_per_sec.is_finite() || config.max_events_per_sec <= 0.0 {
            return Err(BreakerError::InvalidCeiling(config.max_events_per_sec));
        }
        if !(config.smoothing_factor > 0.0 && config.smoothing_factor <= 1.0) {
            return Err(BreakerError::InvalidSmoothingFactor(config.smoothing_factor));
        }

        let mut breaker = Self {
            max_events_per_sec: config.max_events_per_sec,
            smoothing_factor: config.smoothing_factor,
            pending_ticks: 0,
            smoothed_rate: 0.0,
            last_update: None,
            open: false,
            has_sample: false,
        };
        breaker.reset();
        Ok(breaker)
    }

    /// Record `count` events for the current interval.
    ///
    /// Counts are unsigned, so a negative contribution cannot be expressed.
    pub fn tick(&mut self, count: u64) {
        self.pending_ticks = self.pending_ticks.saturating_add(count);
    }

    /// Close the current interval at `now` and recompute the breaker state.
    ///
    /// The first sample after construction or `reset` is taken verbatim.
    /// A `now` that does not advance past the previous update uses the raw
    /// pending count as the sample instead of dividing by zero.
    pub fn update(&mut self, now: Instant) -> Transition {
        let pending = self.pending_ticks as f64;

        let sample = match self.last_update {
            Some(last) => {
                let elapsed = now.saturating_duration_since(last).as_secs_f64();
                if elapsed > 0.0 {
                    pending / elapsed
                } else {
                    pending
                }
            }
            None => pending,
        };

        if self.has_sample {
            self.smoothed_rate += self.smoothing_factor * (sample - self.smoothed_rate);
        } else {
            self.smoothed_rate = sample;
        }

        let was_open = self.open;
        self.open = self.smoothed_rate > self.max_events_per_sec;

        self.pending_ticks = 0;
        self.last_update = Some(now);
        self.has_sample = true;

        match (was_open, self.open) {
            (false, true) => Transition::Tripped,
            (true, false) => Transition::Recovered,
            _ => Transition::Unchanged,
        }
    }

    /// Whether the breaker is currently open.
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn state(&self) -> BreakerState {
        BreakerState::from_open(self.open)
    }

    /// Re-arm the breaker, discarding all smoothing history.
    pub fn reset(&mut self) {
        self.pending_ticks = 0;
        self.smoothed_rate = 0.0;
        self.last_update = None;
        self.open = false;
        self.has_sample = false;
    }

    /// Current smoothed rate in events per second.
    pub fn rate(&self) -> f64 {
        self.smoothed_rate
    }

    pub fn pending_ticks(&self) -> u64 {
        self.pending_ticks
    }

    pub fn max_events_per_sec(&self) -> f64 {
        self.max_events_per_sec
    }

    pub fn smoothing_factor(&self) -> f64 {
        self.smoothing_factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn breaker(max: f64) -> RateCircuitBreaker {
        RateCircuitBreaker::new(max).unwrap()
    }

    #[test]
    fn test_initial_state() {
        let cb = breaker(100.0);
        assert!(!cb.is_open());
        assert_eq!(cb.state(), BreakerState::Closed);
        assert_eq!(cb.pending_ticks(), 0);
        assert_eq!(cb.rate(), 0.0);
    }

    #[test]
    fn test_invalid_ceiling_rejected() {
        assert_eq!(
            RateCircuitBreaker::new(0.0).unwrap_err(),
            BreakerError::InvalidCeiling(0.0)
        );
        assert!(RateCircuitBreaker::new(-5.0).is_err());
        assert!(RateCircuitBreaker::new(f64::NAN).is_err());
        assert!(RateCircuitBreaker::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_invalid_smoothing_factor_rejected() {
        for alpha in [0.0, -0.1, 1.5, f64::NAN] {
            let config = BreakerConfig {
                max_events_per_sec: 100.0,
                smoothing_factor: alpha,
            };
            assert!(matches!(
                RateCircuitBreaker::with_config(config),
                Err(BreakerError::InvalidSmoothingFactor(_))
            ));
        }
    }

    #[test]
    fn test_tick_accumulates_without_evaluating() {
        let mut cb = breaker(100.0);
        cb.tick(150);
        cb.tick(150);
        assert_eq!(cb.pending_ticks(), 300);
        assert!(!cb.is_open());
    }

    #[test]
    fn test_tick_saturates() {
        let mut cb = breaker(100.0);
        cb.tick(u64::MAX);
        cb.tick(10);
        assert_eq!(cb.pending_ticks(), u64::MAX);
    }

    #[test]
    fn test_first_sample_taken_verbatim() {
        let mut cb = breaker(100.0);
        cb.tick(101);
        assert_eq!(cb.update(Instant::now()), Transition::Tripped);
        assert!(cb.is_open());
        assert_eq!(cb.rate(), 101.0);
        assert_eq!(cb.pending_ticks(), 0);
    }

    #[test]
    fn test_rate_divides_by_elapsed() {
        let mut cb = RateCircuitBreaker::with_config(BreakerConfig {
            max_events_per_sec: 100.0,
            smoothing_factor: 1.0,
        })
        .unwrap();
        let now = Instant::now();
        cb.update(now);

        cb.tick(100);
        cb.update(now + Duration::from_secs(2));
        assert_eq!(cb.rate(), 50.0);
    }

    #[test]
    fn test_repeated_timestamp_uses_raw_count() {
        let mut cb = RateCircuitBreaker::with_config(BreakerConfig {
            max_events_per_sec: 100.0,
            smoothing_factor: 1.0,
        })
        .unwrap();
        let now = Instant::now();
        cb.tick(10);
        cb.update(now);

        cb.tick(40);
        cb.update(now);
        assert_eq!(cb.rate(), 40.0);
        assert!(cb.rate().is_finite());
    }

    #[test]
    fn test_backwards_clock_does_not_panic() {
        let mut cb = breaker(100.0);
        let now = Instant::now() + Duration::from_secs(10);
        cb.tick(10);
        cb.update(now);

        cb.tick(10);
        cb.update(now - Duration::from_secs(5));
        assert!(cb.rate().is_finite());
        assert!(cb.rate() >= 0.0);
    }

    #[test]
    fn test_recovers_when_rate_drops() {
        let mut cb = breaker(100.0);
        let mut now = Instant::now();
        cb.tick(200);
        cb.update(now);
        assert!(cb.is_open());

        let mut recovered = false;
        for _ in 0..30 {
            now += Duration::from_secs(1);
            cb.tick(10);
            if cb.update(now) == Transition::Recovered {
                recovered = true;
                break;
            }
        }
        assert!(recovered);
        assert!(!cb.is_open());
    }

    #[test]
    fn test_reset() {
        let mut cb = breaker(100.0);
        cb.tick(200);
        cb.update(Instant::now());
        assert!(cb.is_open());
        cb.tick(5);

        cb.reset();
        assert!(!cb.is_open());
        assert_eq!(cb.rate(), 0.0);
        assert_eq!(cb.pending_ticks(), 0);
        assert_eq!(cb.max_events_per_sec(), 100.0);
    }

    #[test]
    fn test_clone() {
        let mut cb1 = breaker(100.0);
        cb1.tick(7);

        let cb2 = cb1.clone();
        assert_eq!(cb2.pending_ticks(), 7);
    }
}
