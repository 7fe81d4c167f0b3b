//! Persistence contract: this crate only depends on a sink trait. The actual
//! storage backend (schema, retention, query surface) lives outside this
//! scope; what's here is enough to exercise the batching/flush behavior and
//! to give tests something concrete to assert against.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::warn;

use crate::model::{CrossOpportunity, TriOpportunity, VenueHealth};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("persistence backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone)]
pub enum Record {
    Cross(CrossOpportunity),
    Tri(TriOpportunity),
    Health(VenueHealth),
}

/// What a storage backend must support. Implementors own their own schema;
/// this crate only ever calls through this trait.
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    async fn append_batch(&self, records: &[Record]) -> Result<(), PersistError>;
}

/// An in-memory sink that just accumulates records. Good enough for tests and
/// for a dry-run process that doesn't want a real backend wired up.
#[derive(Default)]
pub struct InMemorySink {
    records: Mutex<Vec<Record>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Vec<Record> {
        self.records.lock().clone()
    }
}

#[async_trait]
impl PersistenceSink for InMemorySink {
    async fn append_batch(&self, records: &[Record]) -> Result<(), PersistError> {
        self.records.lock().extend_from_slice(records);
        Ok(())
    }
}

const BATCH_SIZE: usize = 10;
const FLUSH_INTERVAL: Duration = Duration::from_secs(5);

/// Buffers records and flushes them to the backend either once `BATCH_SIZE`
/// accumulates or every `FLUSH_INTERVAL`, whichever comes first; always
/// flushes once more on shutdown.
#[derive(Clone)]
pub struct PersistenceWriter {
    tx: mpsc::UnboundedSender<Record>,
}

impl PersistenceWriter {
    pub fn new(
        sink: Arc<dyn PersistenceSink>,
        shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> (Self, impl std::future::Future<Output = ()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let writer = Self { tx };
        let consumer = run_writer(rx, sink, shutdown);
        (writer, consumer)
    }

    pub fn append(&self, record: Record) {
        if self.tx.send(record).is_err() {
            warn!("persistence writer task has stopped, dropping record");
        }
    }
}

async fn run_writer(
    mut rx: mpsc::UnboundedReceiver<Record>,
    sink: Arc<dyn PersistenceSink>,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) {
    let mut buf: Vec<Record> = Vec::with_capacity(BATCH_SIZE);
    let mut ticker = tokio::time::interval(FLUSH_INTERVAL);

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    if !buf.is_empty() {
                        let _ = sink.append_batch(&buf).await;
                    }
                    break;
                }
            }
            _ = ticker.tick() => {
                if !buf.is_empty() {
                    if let Err(e) = sink.append_batch(&buf).await {
                        warn!(error = %e, "persistence flush failed");
                    }
                    buf.clear();
                }
            }
            maybe_record = rx.recv() => {
                let Some(record) = maybe_record else { break };
                buf.push(record);
                if buf.len() >= BATCH_SIZE {
                    if let Err(e) = sink.append_batch(&buf).await {
                        warn!(error = %e, "persistence flush failed");
                    }
                    buf.clear();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DetectionMode};

    fn cross() -> CrossOpportunity {
        CrossOpportunity {
            symbol: "BTC/USDT".into(),
            buy_venue: "a".into(),
            sell_venue: "b".into(),
            buy_price_before: 1.0,
            sell_price_before: 1.0,
            buy_price_after: 1.0,
            sell_price_after: 1.0,
            spread_bps: 20.0,
            notional: 100.0,
            buy_levels_used: 1,
            sell_levels_used: 1,
            buy_fees: (0.0, 0.0),
            sell_fees: (0.0, 0.0),
            detection_ts: chrono::Utc::now(),
            mode: DetectionMode::Stream,
        }
    }

    #[tokio::test]
    async fn flush_on_shutdown_delivers_buffered_records() {
        let sink = Arc::new(InMemorySink::new());
        let (tx, rx) = tokio::sync::watch::channel(false);
        let (writer, consumer) = PersistenceWriter::new(sink.clone(), rx);
        let handle = tokio::spawn(consumer);

        writer.append(Record::Cross(cross()));
        writer.append(Record::Cross(cross()));

        tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(sink.len(), 2);
    }

    #[tokio::test]
    async fn batch_size_triggers_flush_without_waiting_for_interval() {
        let sink = Arc::new(InMemorySink::new());
        let (_tx, rx) = tokio::sync::watch::channel(false);
        let (writer, consumer) = PersistenceWriter::new(sink.clone(), rx);
        let handle = tokio::spawn(consumer);

        for _ in 0..BATCH_SIZE {
            writer.append(Record::Cross(cross()));
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(sink.len(), BATCH_SIZE);
        handle.abort();
    }
}
