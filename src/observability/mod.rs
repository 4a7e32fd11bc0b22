//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Breaker monitor and event counter produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters and gauges)
//!
//! Consumers:
//!     → stdout/stderr log output
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields (rate, ceiling) instead of formatted strings
//! - Metric calls are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
