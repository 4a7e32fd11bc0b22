//! netlink-breaker
//!
//! # Architecture Overview
//!
//! ```text
//!   counts (stdin / capture file)
//!          │
//!          ▼
//!   ┌──────────────┐  tick(n)   ┌────────────────────┐  update(now)  ┌────────────────┐
//!   │ event source │──────────▶│ RateCircuitBreaker │◀──────────────│ BreakerMonitor │
//!   └──────────────┘           └─────────┬──────────┘               └───────┬────────┘
//!                                        │ is_open()                        │
//!                                        ▼                                  ▼
//!                                 load shedding                    logs / metrics / watch
//! ```
//!
//! `replay` runs a capture through the breaker at simulated timestamps.
//! `watch` reads live counts from stdin and drives the breaker in real time.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tokio::io::BufReader;

use netlink_breaker::breaker::{RateCircuitBreaker, SharedBreaker};
use netlink_breaker::config::{load_config, MonitorConfig};
use netlink_breaker::lifecycle::{wait_for_shutdown_signal, Shutdown};
use netlink_breaker::monitor::{feed_counts, BreakerMonitor, EventCounter};
use netlink_breaker::observability::{logging, metrics};
use netlink_breaker::replay::{parse_counts, replay, ReplayReport};

#[derive(Parser)]
#[command(name = "netlink-breaker")]
#[command(about = "Event rate circuit breaker", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct BreakerOverrides {
    /// Override the configured ceiling (events per second).
    #[arg(long)]
    max_events_per_sec: Option<f64>,

    /// Override the configured EWMA smoothing factor.
    #[arg(long)]
    smoothing_factor: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a capture of per-interval counts and report state transitions
    Replay {
        /// File with one event count per line ("-" for stdin)
        file: PathBuf,

        /// Simulated seconds between samples
        #[arg(long, default_value_t = 1.0)]
        interval_secs: f64,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        overrides: BreakerOverrides,
    },
    /// Read live counts from stdin and monitor the event rate
    Watch {
        #[command(flatten)]
        overrides: BreakerOverrides,
    },
}

fn load(
    path: Option<&Path>,
    overrides: &BreakerOverrides,
) -> Result<MonitorConfig, Box<dyn std::error::Error>> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => MonitorConfig::default(),
    };
    if let Some(max) = overrides.max_events_per_sec {
        config.breaker.max_events_per_sec = max;
    }
    if let Some(alpha) = overrides.smoothing_factor {
        config.breaker.smoothing_factor = alpha;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Replay { file, interval_secs, json, overrides } => {
            let config = load(cli.config.as_deref(), &overrides)?;
            logging::init_logging(&config.observability.log_level);

            let interval = Duration::try_from_secs_f64(interval_secs)?;
            let counts = if file.as_os_str() == "-" {
                parse_counts(std::io::stdin().lock())?
            } else {
                parse_counts(std::io::BufReader::new(std::fs::File::open(&file)?))?
            };

            let report = replay(&counts, config.breaker, interval)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
        Commands::Watch { overrides } => {
            let config = load(cli.config.as_deref(), &overrides)?;
            logging::init_logging(&config.observability.log_level);
            watch(config).await?;
        }
    }

    Ok(())
}

async fn watch(config: MonitorConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        max_events_per_sec = config.breaker.max_events_per_sec,
        smoothing_factor = config.breaker.smoothing_factor,
        tick_interval_ms = config.monitor.tick_interval_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let breaker = SharedBreaker::new(RateCircuitBreaker::with_config(config.breaker)?);
    let shutdown = Shutdown::new();

    let monitor = BreakerMonitor::new(breaker.clone(), config.monitor.clone());
    let monitor_task = tokio::spawn(monitor.run(shutdown.subscribe()));

    let source = feed_counts(
        BufReader::new(tokio::io::stdin()),
        EventCounter::new(breaker.clone()),
        shutdown.subscribe(),
    );

    // The monitor is always stopped and flushed, even when the source fails
    let outcome: Result<(), Box<dyn std::error::Error>> = tokio::select! {
        res = source => res.map(|_| ()).map_err(Into::into),
        res = wait_for_shutdown_signal() => res.map_err(Into::into),
    };

    shutdown.trigger();
    let report = monitor_task.await?;
    let snapshot = breaker.snapshot();

    tracing::info!(
        updates = report.updates,
        trips = report.trips,
        recoveries = report.recoveries,
        state = snapshot.state.as_str(),
        rate = snapshot.rate,
        "Shutdown complete"
    );
    outcome
}

fn print_report(report: &ReplayReport) {
    println!(
        "ceiling: {} events/s, smoothing factor: {}",
        report.max_events_per_sec, report.smoothing_factor
    );
    for event in &report.transitions {
        println!(
            "  sample {:>5} (t={:>8.1}s): {:?} at {:.2} events/s",
            event.sample, event.at_secs, event.transition, event.rate
        );
    }
    println!(
        "{} samples, {} open, peak {:.2} events/s, final {} at {:.2} events/s",
        report.samples,
        report.samples_open,
        report.peak_rate,
        report.final_state.as_str(),
        report.final_rate
    );
}
