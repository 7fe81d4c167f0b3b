//! Per-stream coalescing queue and the coalescer task that drains it into the
//! Book Store.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{debug, trace};

use crate::book_store::BookStore;
use crate::model::{OrderBook, VenueHealthState};

const QUEUE_CAPACITY: usize = 2;

/// A bounded, drop-oldest queue of snapshots for one (venue, symbol) stream.
/// Ingestors push into it; exactly one coalescer task drains it.
pub struct CoalesceQueue {
    buf: Mutex<VecDeque<OrderBook>>,
    notify: Notify,
}

impl Default for CoalesceQueue {
    fn default() -> Self {
        Self {
            buf: Mutex::new(VecDeque::with_capacity(QUEUE_CAPACITY)),
            notify: Notify::new(),
        }
    }
}

impl CoalesceQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a snapshot. If the queue is already at capacity the oldest
    /// entry is dropped; the caller is responsible for incrementing
    /// `coalesced_count` on the venue's health state when this happens.
    pub fn push(&self, book: OrderBook) -> bool {
        let mut buf = self.buf.lock();
        let dropped = if buf.len() >= QUEUE_CAPACITY {
            buf.pop_front();
            true
        } else {
            false
        };
        buf.push_back(book);
        drop(buf);
        self.notify.notify_one();
        dropped
    }

    fn drain_newest(&self) -> Option<OrderBook> {
        let mut buf = self.buf.lock();
        buf.pop_back().map(|newest| {
            buf.clear();
            newest
        })
    }

    fn is_empty(&self) -> bool {
        self.buf.lock().is_empty()
    }

    async fn wait_for_item(&self) {
        if !self.is_empty() {
            return;
        }
        self.notify.notified().await;
    }

    pub fn depth(&self) -> usize {
        self.buf.lock().len()
    }
}

/// Runs the coalescer loop for one stream until `shutdown` fires: block on
/// the queue, wait the coalesce window, drain keeping the newest, publish.
pub async fn run_coalescer(
    queue: Arc<CoalesceQueue>,
    store: Arc<BookStore>,
    health: Arc<VenueHealthState>,
    coalesce_window: Duration,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
            _ = queue.wait_for_item() => {
                tokio::time::sleep(coalesce_window).await;
                if let Some(newest) = queue.drain_newest() {
                    trace!(venue = %newest.venue, symbol = %newest.symbol, "publishing coalesced snapshot");
                    store.publish(newest);
                }
                health.set_queue_depth(queue.depth() as u64);
            }
        }
    }
    debug!("coalescer task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DepthLevel, Symbol};
    use chrono::Utc;

    fn book(nonce: u64) -> OrderBook {
        OrderBook {
            venue: "binance".into(),
            symbol: Symbol::new("BTC", "USDT").unwrap(),
            bids: vec![DepthLevel { price: 99.0, amount: 1.0 }],
            asks: vec![DepthLevel { price: 101.0, amount: 1.0 }],
            timestamp: Utc::now(),
            nonce: Some(nonce),
        }
    }

    #[test]
    fn push_beyond_capacity_drops_oldest() {
        let q = CoalesceQueue::new();
        assert!(!q.push(book(1)));
        assert!(!q.push(book(2)));
        assert!(q.push(book(3))); // capacity 2, this push drops nonce=1
        let newest = q.drain_newest().unwrap();
        assert_eq!(newest.nonce, Some(3));
        assert!(q.is_empty());
    }

    #[tokio::test]
    async fn coalescer_publishes_only_the_newest_snapshot_in_a_window() {
        let queue = Arc::new(CoalesceQueue::new());
        let store = Arc::new(BookStore::new());
        let health = Arc::new(VenueHealthState::new("binance"));
        let (tx, rx) = tokio::sync::watch::channel(false);

        queue.push(book(1));
        queue.push(book(2));

        let handle = tokio::spawn(run_coalescer(
            queue.clone(),
            store.clone(),
            health,
            Duration::from_millis(10),
            rx,
        ));

        tokio::time::sleep(Duration::from_millis(50)).await;
        let symbol = Symbol::new("BTC", "USDT").unwrap();
        let got = store.get("binance", &symbol).unwrap();
        assert_eq!(got.nonce, Some(2));

        tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
