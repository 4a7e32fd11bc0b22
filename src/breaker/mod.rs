//! Rate circuit breaker subsystem.
//!
//! # Data Flow
//! ```text
//! Event source (netlink socket, stdin, ...):
//!     → tick(n) accumulates pending events
//!     → update(now) turns pending events into a rate sample
//!     → EWMA smoothing against the previous estimate
//!     → smoothed rate > ceiling ⇒ Open, otherwise Closed
//!
//! Supervisor:
//!     → is_open() to decide whether to shed load
//!     → reset() to re-arm after corrective action
//! ```
//!
//! # Design Decisions
//! - One scalar rate signal, one ceiling
//! - Level-triggered: state is recomputed on every update, never latched
//! - First sample is taken verbatim so a flood at startup trips immediately
//! - No internal locking; `shared.rs` serializes access when needed

pub mod rate;
pub mod shared;

pub use rate::{BreakerConfig, BreakerError, BreakerState, RateCircuitBreaker, Transition};
pub use shared::SharedBreaker;
