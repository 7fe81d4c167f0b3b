//! Poll-mode ingestion: request/response snapshots at an adaptive cadence,
//! gated by a per-venue concurrency limiter and minimum inter-request
//! spacing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::warn;

use crate::coalescer::CoalesceQueue;
use crate::connector::Connector;
use crate::model::{Symbol, VenueHealthState};

/// Per-venue gate on simultaneous in-flight poll requests:
/// `max(1, min(10, 1000 / venue_rate_limit_ms))`.
pub fn concurrency_for_rate_limit(venue_rate_limit_ms: u64) -> usize {
    if venue_rate_limit_ms == 0 {
        return 10;
    }
    let computed = 1000 / venue_rate_limit_ms;
    computed.clamp(1, 10) as usize
}

pub fn build_gate(venue_rate_limit_ms: u64) -> Arc<Semaphore> {
    Arc::new(Semaphore::new(concurrency_for_rate_limit(venue_rate_limit_ms)))
}

/// Runs poll-mode ingestion for (venue, symbol) until `shutdown` fires.
///
/// Every tick acquires a permit from `gate` (shared across every
/// (venue, symbol) task on the same venue, capping simultaneous in-flight
/// requests) and waits out any remaining time in the venue's declared
/// minimum inter-request spacing before calling the connector.
#[allow(clippy::too_many_arguments)]
pub async fn run_poll_ingestor(
    connector: Arc<dyn Connector>,
    symbol: Symbol,
    depth: usize,
    queue: Arc<CoalesceQueue>,
    health: Arc<VenueHealthState>,
    interval_hot: Duration,
    interval_cold: Duration,
    hot_symbols: Arc<Vec<String>>,
    gate: Arc<Semaphore>,
    venue_min_spacing: Duration,
    last_request_at: Arc<parking_lot::Mutex<Option<Instant>>>,
    shutdown: Arc<AtomicBool>,
) {
    let symbol_str = symbol.to_string();
    let interval = if hot_symbols.iter().any(|s| s == &symbol_str) {
        interval_hot
    } else {
        interval_cold
    };

    let venue = connector.venue().to_string();
    let mut ticker = tokio::time::interval(interval);

    while !shutdown.load(Ordering::Relaxed) {
        ticker.tick().await;

        let Ok(_permit) = gate.acquire().await else {
            break; // gate closed, process is shutting down
        };

        let wait_until = {
            let mut last = last_request_at.lock();
            let now = Instant::now();
            let target = match *last {
                Some(prev) => (prev + venue_min_spacing).max(now),
                None => now,
            };
            *last = Some(target);
            target
        };
        tokio::time::sleep_until(wait_until).await;

        match connector.poll_book(&symbol, depth).await {
            Ok(book) => {
                health.mark_rest_call(true);
                if queue.push(book) {
                    health.incr_coalesced();
                }
            }
            Err(e) => {
                health.mark_rest_call(false);
                health.incr_error();
                warn!(venue = %venue, symbol = %symbol, error = %e, "poll tick dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    use crate::connector::{Connector, ConnectorError};
    use crate::model::{DepthLevel, Fees, OrderBook};

    #[test]
    fn concurrency_gate_respects_bounds() {
        assert_eq!(concurrency_for_rate_limit(50), 10); // 1000/50=20, clamped to 10
        assert_eq!(concurrency_for_rate_limit(200), 5);
        assert_eq!(concurrency_for_rate_limit(2000), 1); // 1000/2000=0, clamped to 1
    }

    struct CountingConnector {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Connector for CountingConnector {
        fn venue(&self) -> &str {
            "mock"
        }

        async fn connect(&self) -> Result<(), ConnectorError> {
            Ok(())
        }

        async fn disconnect(&self) {}

        async fn poll_book(&self, symbol: &Symbol, _depth: usize) -> Result<OrderBook, ConnectorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(OrderBook {
                venue: "mock".to_string(),
                symbol: symbol.clone(),
                bids: vec![DepthLevel { price: 1.0, amount: 1.0 }],
                asks: vec![DepthLevel { price: 1.1, amount: 1.0 }],
                timestamp: chrono::Utc::now(),
                nonce: None,
            })
        }

        fn supports_streaming(&self) -> bool {
            false
        }

        async fn public_fees(&self) -> Option<Fees> {
            None
        }
    }

    #[tokio::test(start_paused = true)]
    async fn minimum_spacing_is_enforced_between_requests() {
        let calls = Arc::new(AtomicUsize::new(0));
        let connector: Arc<dyn Connector> = Arc::new(CountingConnector { calls: calls.clone() });
        let queue = Arc::new(CoalesceQueue::new());
        let health = Arc::new(VenueHealthState::new("mock"));
        let shutdown = Arc::new(AtomicBool::new(false));
        let gate = build_gate(2000); // 1 permit at a time
        let last_request_at = Arc::new(parking_lot::Mutex::new(None));
        let symbol = Symbol::new("BTC", "USDT").unwrap();

        let handle = tokio::spawn(run_poll_ingestor(
            connector,
            symbol,
            5,
            queue,
            health,
            Duration::from_millis(10),
            Duration::from_millis(10),
            Arc::new(vec![]),
            gate,
            Duration::from_millis(500),
            last_request_at,
            shutdown.clone(),
        ));

        tokio::time::advance(Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1); // ticks fired but spacing held back extra requests

        tokio::time::advance(Duration::from_millis(500)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        shutdown.store(true, Ordering::Relaxed);
        handle.abort();
    }
}
