//! Offline replay of recorded per-interval counts.
//!
//! Feeds a series of counts through a breaker at simulated timestamps so the
//! smoothing factor can be calibrated against real traffic captures.
//!
//! # Input format
//! One non-negative integer per line. Blank lines and lines starting with `#`
//! are skipped.

use std::io::BufRead;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;

use crate::breaker::{BreakerConfig, BreakerError, BreakerState, RateCircuitBreaker, Transition};

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: invalid event count '{value}'")]
    InvalidCount { line: usize, value: String },

    #[error(transparent)]
    Breaker(#[from] BreakerError),

    #[error("sample {sample}: simulated timestamp out of range for the given interval")]
    TimelineOverflow { sample: usize },
}

/// Parse a single input line. Returns `None` for blank and comment lines.
pub fn parse_count_line(line: &str, line_no: usize) -> Option<Result<u64, ReplayError>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    Some(trimmed.parse::<u64>().map_err(|_| ReplayError::InvalidCount {
        line: line_no,
        value: trimmed.to_string(),
    }))
}

/// Read all counts from a line-oriented reader.
pub fn parse_counts<R: BufRead>(reader: R) -> Result<Vec<u64>, ReplayError> {
    let mut counts = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if let Some(count) = parse_count_line(&line, idx + 1) {
            counts.push(count?);
        }
    }
    Ok(counts)
}

/// A state change observed during replay.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReplayEvent {
    /// Zero-based sample index.
    pub sample: usize,
    /// Simulated seconds since the first sample.
    pub at_secs: f64,
    pub transition: Transition,
    pub rate: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReplayReport {
    pub samples: usize,
    pub max_events_per_sec: f64,
    pub smoothing_factor: f64,
    pub final_state: BreakerState,
    pub final_rate: f64,
    pub peak_rate: f64,
    /// Number of samples after which the breaker was open.
    pub samples_open: usize,
    pub transitions: Vec<ReplayEvent>,
}

/// Replay `counts` as consecutive intervals of length `interval`.
pub fn replay(
    counts: &[u64],
    config: BreakerConfig,
    interval: Duration,
) -> Result<ReplayReport, ReplayError> {
    let mut breaker = RateCircuitBreaker::with_config(config)?;
    let start = Instant::now();

    let mut report = ReplayReport {
        samples: counts.len(),
        max_events_per_sec: breaker.max_events_per_sec(),
        smoothing_factor: breaker.smoothing_factor(),
        final_state: BreakerState::Closed,
        final_rate: 0.0,
        peak_rate: 0.0,
        samples_open: 0,
        transitions: Vec::new(),
    };

    let mut offset = Duration::ZERO;
    for (sample, &count) in counts.iter().enumerate() {
        if sample > 0 {
            offset = offset
                .checked_add(interval)
                .ok_or(ReplayError::TimelineOverflow { sample })?;
        }
        let now = start
            .checked_add(offset)
            .ok_or(ReplayError::TimelineOverflow { sample })?;

        breaker.tick(count);
        let transition = breaker.update(now);

        report.peak_rate = report.peak_rate.max(breaker.rate());
        if breaker.is_open() {
            report.samples_open += 1;
        }
        if transition != Transition::Unchanged {
            report.transitions.push(ReplayEvent {
                sample,
                at_secs: offset.as_secs_f64(),
                transition,
                rate: breaker.rate(),
            });
        }
    }

    report.final_state = breaker.state();
    report.final_rate = breaker.rate();
    Ok(report)
}
