//! Self-protecting event rate monitor.
//!
//! A circuit breaker that turns per-interval event counts into an
//! EWMA-smoothed rate and opens when that rate exceeds a ceiling.

pub mod breaker;
pub mod config;
pub mod lifecycle;
pub mod monitor;
pub mod observability;
pub mod replay;

pub use breaker::{RateCircuitBreaker, SharedBreaker};
pub use config::MonitorConfig;
pub use lifecycle::Shutdown;
