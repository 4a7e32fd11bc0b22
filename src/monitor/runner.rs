//! Periodic breaker updates.
//!
//! # Responsibilities
//! - Close an accounting interval on every tick
//! - Report state changes through logs, metrics and a watch channel
//! - Optionally re-arm the breaker after reporting a trip

use std::time::Instant;

use tokio::sync::{broadcast, watch};
use tokio::time::{self, MissedTickBehavior};

use crate::breaker::{BreakerState, SharedBreaker, Transition};
use crate::config::MonitorSettings;
use crate::observability::metrics;

/// Counters accumulated over the lifetime of a monitor loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorReport {
    pub updates: u64,
    pub trips: u64,
    pub recoveries: u64,
}

pub struct BreakerMonitor {
    breaker: SharedBreaker,
    settings: MonitorSettings,
    state_tx: watch::Sender<BreakerState>,
    report: MonitorReport,
}

impl BreakerMonitor {
    pub fn new(breaker: SharedBreaker, settings: MonitorSettings) -> Self {
        let (state_tx, _) = watch::channel(breaker.snapshot().state);
        Self {
            breaker,
            settings,
            state_tx,
            report: MonitorReport::default(),
        }
    }

    /// Follow breaker state as seen after each update.
    pub fn subscribe(&self) -> watch::Receiver<BreakerState> {
        self.state_tx.subscribe()
    }

    /// Run the update loop until shutdown is signalled.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> MonitorReport {
        let period = self.settings.tick_interval();
        tracing::info!(
            interval_ms = self.settings.tick_interval_ms,
            max_events_per_sec = self.breaker.snapshot().max_events_per_sec,
            "Breaker monitor starting"
        );

        let mut ticker = time::interval_at(time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.step(Instant::now());
                }
                _ = shutdown.recv() => {
                    tracing::info!("Breaker monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }

        // Close the partial interval so late events are still accounted for
        if self.breaker.snapshot().pending_ticks > 0 {
            self.step(Instant::now());
        }

        self.report
    }

    /// Close one interval at `now`.
    pub fn step(&mut self, now: Instant) -> Transition {
        let reset_on_trip = self.settings.reset_after_open;
        let (transition, snapshot) = self.breaker.update_snapshot(now, reset_on_trip);
        self.report.updates += 1;

        metrics::record_rate(snapshot.rate);
        metrics::record_state(snapshot.state == BreakerState::Open);
        metrics::record_transition(transition);

        match transition {
            Transition::Tripped => {
                self.report.trips += 1;
                tracing::warn!(
                    rate = snapshot.rate,
                    max_events_per_sec = snapshot.max_events_per_sec,
                    "Event rate above ceiling, circuit breaker open"
                );
            }
            Transition::Recovered => {
                self.report.recoveries += 1;
                tracing::info!(
                    rate = snapshot.rate,
                    max_events_per_sec = snapshot.max_events_per_sec,
                    "Event rate back under ceiling, circuit breaker closed"
                );
            }
            Transition::Unchanged => {
                tracing::debug!(
                    rate = snapshot.rate,
                    state = snapshot.state.as_str(),
                    "Breaker updated"
                );
            }
        }
        self.state_tx.send_replace(snapshot.state);

        if transition == Transition::Tripped && reset_on_trip {
            metrics::record_reset();
            tracing::info!("Circuit breaker re-armed");
            self.state_tx.send_replace(BreakerState::Closed);
        }

        transition
    }
}
