//! Breaker monitor subsystem.
//!
//! # Data Flow
//! ```text
//! Producer side:
//!     source.rs (line-oriented counts) → counter.rs EventCounter::record(n) → tick(n)
//!
//! Update loop (runner.rs):
//!     every tick_interval → update(now) → log + metrics
//!         → watch channel publishes BreakerState
//!         → optional reset after a trip
//! ```
//!
//! # Design Decisions
//! - The loop only calls update; producers only call tick
//! - First update happens one interval after start, never at t=0
//! - Interval drift is absorbed by the elapsed-time rate computation

pub mod counter;
pub mod runner;
pub mod source;

pub use counter::EventCounter;
pub use runner::{BreakerMonitor, MonitorReport};
pub use source::feed_counts;
