//! Dedup -> rate-limited send pipeline. Scanners hand opportunities to
//! [`AlertPipeline::notify_cross`] / `notify_tri`; a single consumer task
//! enforces the minimum inter-send spacing against the external transport.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::model::{CrossOpportunity, TriOpportunity};

use super::dedup::DedupTable;
use super::message::{format_cross, format_tri};

#[derive(Debug, Error)]
pub enum SendError {
    #[error("notification transport error: {0}")]
    Transport(String),
}

/// The external collaborator that actually delivers a message (email, chat
/// webhook, SMS...). This crate only depends on the contract.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), SendError>;
}

/// A sink that only logs; useful when no real transport is wired up yet.
pub struct LoggingSink;

#[async_trait]
impl NotificationSink for LoggingSink {
    async fn send(&self, text: &str) -> Result<(), SendError> {
        info!(alert = text, "alert (logging sink)");
        Ok(())
    }
}

/// Producer-side handle: checks dedup, formats the message, and queues it for
/// the rate-limited consumer. Cheap to clone and share across scanner tasks.
#[derive(Clone)]
pub struct AlertPipeline {
    tx: mpsc::UnboundedSender<String>,
    dedup: Arc<DedupTable>,
}

impl AlertPipeline {
    /// Builds the pipeline and returns it alongside the consumer future the
    /// caller must spawn.
    pub fn new(
        sink: Arc<dyn NotificationSink>,
        dedup_ttl: Duration,
        min_send_interval: Duration,
        shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> (Self, impl std::future::Future<Output = ()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let dedup = Arc::new(DedupTable::new(dedup_ttl));
        let pipeline = Self { tx, dedup: dedup.clone() };
        let consumer = run_consumer(rx, sink, min_send_interval, dedup, shutdown);
        (pipeline, consumer)
    }

    pub fn notify_cross(&self, opp: &CrossOpportunity) {
        self.enqueue(&opp.dedup_key(), || format_cross(opp));
    }

    pub fn notify_tri(&self, opp: &TriOpportunity) {
        self.enqueue(&opp.dedup_key(), || format_tri(opp));
    }

    fn enqueue(&self, key: &str, render: impl FnOnce() -> String) {
        if !self.dedup.admit(key, Instant::now()) {
            return;
        }
        if self.tx.send(render()).is_err() {
            warn!("alert consumer task has stopped, dropping message");
        }
    }
}

async fn run_consumer(
    mut rx: mpsc::UnboundedReceiver<String>,
    sink: Arc<dyn NotificationSink>,
    min_send_interval: Duration,
    dedup: Arc<DedupTable>,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) {
    let mut last_sent: Option<Instant> = None;
    let mut eviction = tokio::time::interval(Duration::from_secs(30));

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
            _ = eviction.tick() => {
                dedup.evict(Instant::now());
            }
            maybe_msg = rx.recv() => {
                let Some(text) = maybe_msg else { break };
                if let Some(last) = last_sent {
                    let elapsed = last.elapsed();
                    if elapsed < min_send_interval {
                        tokio::time::sleep(min_send_interval - elapsed).await;
                    }
                }
                if let Err(e) = sink.send(&text).await {
                    warn!(error = %e, "alert send failed");
                }
                last_sent = Some(Instant::now());
            }
        }
    }
}
