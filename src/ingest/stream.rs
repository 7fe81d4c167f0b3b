//! Stream-mode ingestion: a persistent connection per (venue, symbol) with
//! exponential-backoff reconnect, downgrading to poll mode after the retry
//! budget is exhausted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::coalescer::CoalesceQueue;
use crate::connector::Connector;
use crate::model::{Symbol, VenueHealthState};

use super::poll::run_poll_ingestor;

pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            max_attempts: 5,
        }
    }
}

/// Runs stream-mode ingestion for (venue, symbol) until `shutdown` fires or
/// the reconnect budget is exhausted, at which point it falls back to poll
/// mode for the remainder of the process lifetime. `gate` and
/// `venue_min_spacing` are only consulted once downgraded to poll mode; they
/// should be shared across every (venue, symbol) task on the same venue.
#[allow(clippy::too_many_arguments)]
pub async fn run_stream_ingestor(
    connector: Arc<dyn Connector>,
    symbol: Symbol,
    depth: usize,
    queue: Arc<CoalesceQueue>,
    health: Arc<VenueHealthState>,
    policy: ReconnectPolicy,
    poll_interval_hot: Duration,
    poll_interval_cold: Duration,
    hot_symbols: Arc<Vec<String>>,
    gate: Arc<Semaphore>,
    venue_min_spacing: Duration,
    last_request_at: Arc<parking_lot::Mutex<Option<tokio::time::Instant>>>,
    shutdown: Arc<AtomicBool>,
) {
    let venue = connector.venue().to_string();
    let mut attempt: u32 = 0;
    let mut delay = policy.base_delay;

    loop {
        if shutdown.load(Ordering::Relaxed) {
            return;
        }

        match connector.connect().await {
            Ok(()) => {
                attempt = 0;
                delay = policy.base_delay;
                health.mark_stream_message();
                info!(venue = %venue, symbol = %symbol, "stream connected");

                // Poll the connector for fresh snapshots as a stand-in for a
                // genuine push-based subscription loop; venue-specific
                // connectors drive their own incremental parsing internally
                // and surface full depth-N snapshots here.
                while !shutdown.load(Ordering::Relaxed) {
                    match connector.poll_book(&symbol, depth).await {
                        Ok(book) => {
                            health.mark_stream_message();
                            if queue.push(book) {
                                health.incr_coalesced();
                            }
                        }
                        Err(e) => {
                            warn!(venue = %venue, symbol = %symbol, error = %e, "stream read failed");
                            health.incr_error();
                            health.mark_stream_disconnected();
                            break;
                        }
                    }
                }
                connector.disconnect().await;
            }
            Err(e) => {
                health.incr_error();
                warn!(venue = %venue, symbol = %symbol, attempt, error = %e, "stream connect failed");
            }
        }

        if shutdown.load(Ordering::Relaxed) {
            return;
        }

        attempt += 1;
        if attempt > policy.max_attempts {
            warn!(venue = %venue, symbol = %symbol, "reconnect budget exhausted, downgrading to poll mode");
            health.incr_reconnect();
            run_poll_ingestor(
                connector,
                symbol,
                depth,
                queue,
                health,
                poll_interval_hot,
                poll_interval_cold,
                hot_symbols,
                gate,
                venue_min_spacing,
                last_request_at,
                shutdown,
            )
            .await;
            return;
        }

        health.incr_reconnect();
        tokio::time::sleep(delay).await;
        delay = (delay * 2).min(policy.max_delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = ReconnectPolicy::default();
        let mut delay = policy.base_delay;
        for _ in 0..10 {
            delay = (delay * 2).min(policy.max_delay);
        }
        assert_eq!(delay, policy.max_delay);
    }
}
