//! Line-oriented event source.
//!
//! Each line carries the number of events observed since the previous line.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::broadcast;

use crate::monitor::counter::EventCounter;
use crate::replay::{parse_count_line, ReplayError};

/// Feed counts from `reader` into `counter` until EOF or shutdown.
///
/// Returns the total number of events recorded.
pub async fn feed_counts<R>(
    reader: R,
    counter: EventCounter,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<u64, ReplayError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut line_no = 0;
    let mut total: u64 = 0;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    tracing::info!(total_events = total, "Event source reached end of input");
                    break;
                };
                line_no += 1;
                match parse_count_line(&line, line_no) {
                    Some(Ok(count)) => {
                        counter.record(count);
                        total = total.saturating_add(count);
                    }
                    Some(Err(e)) => tracing::warn!(error = %e, "Skipping malformed count"),
                    None => {}
                }
            }
            _ = shutdown.recv() => {
                tracing::info!("Event source received shutdown signal");
                break;
            }
        }
    }

    Ok(total)
}
