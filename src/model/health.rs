//! Per-venue connection and pipeline health, updated incrementally by
//! ingestors and the scheduler, read by the health collector.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};

/// Snapshot of a venue's health at one instant. Produced by [`VenueHealthState`]
/// for the persistence sink and the aggregated statistics log line.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct VenueHealth {
    pub venue: String,
    pub stream_connected: bool,
    pub rest_ok: bool,
    pub last_stream_msg_ts: Option<DateTime<Utc>>,
    pub last_rest_ts: Option<DateTime<Utc>>,
    pub reconnect_count: u64,
    pub error_rate: f64,
    pub queue_depth: u64,
    pub coalesced_count: u64,
    pub scheduler_lag_ms: f64,
}

impl VenueHealth {
    pub fn is_healthy(&self, now: DateTime<Utc>) -> bool {
        let stream_recent = self
            .last_stream_msg_ts
            .map(|ts| (now - ts) < chrono::Duration::seconds(60))
            .unwrap_or(false);
        let rest_recent = self
            .last_rest_ts
            .map(|ts| (now - ts) < chrono::Duration::seconds(60))
            .unwrap_or(false);
        (self.stream_connected && stream_recent) || (self.rest_ok && rest_recent)
    }
}

/// Lock-free live counters for one venue; `snapshot()` renders a [`VenueHealth`]
/// on demand for the health collector without blocking the hot ingest path.
#[derive(Debug)]
pub struct VenueHealthState {
    venue: String,
    stream_connected: AtomicBool,
    rest_ok: AtomicBool,
    last_stream_msg_ms: AtomicI64,
    last_rest_ms: AtomicI64,
    reconnect_count: AtomicU64,
    error_count: AtomicU64,
    queue_depth: AtomicU64,
    coalesced_count: AtomicU64,
    scheduler_lag_ms_bits: AtomicU64,
}

impl VenueHealthState {
    pub fn new(venue: impl Into<String>) -> Self {
        Self {
            venue: venue.into(),
            stream_connected: AtomicBool::new(false),
            rest_ok: AtomicBool::new(false),
            last_stream_msg_ms: AtomicI64::new(0),
            last_rest_ms: AtomicI64::new(0),
            reconnect_count: AtomicU64::new(0),
            error_count: AtomicU64::new(0),
            queue_depth: AtomicU64::new(0),
            coalesced_count: AtomicU64::new(0),
            scheduler_lag_ms_bits: AtomicU64::new(0),
        }
    }

    pub fn mark_stream_message(&self) {
        self.stream_connected.store(true, Ordering::Relaxed);
        self.last_stream_msg_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    pub fn mark_stream_disconnected(&self) {
        self.stream_connected.store(false, Ordering::Relaxed);
    }

    pub fn mark_rest_call(&self, ok: bool) {
        self.rest_ok.store(ok, Ordering::Relaxed);
        if ok {
            self.last_rest_ms
                .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
        }
    }

    pub fn incr_reconnect(&self) {
        self.reconnect_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_error(&self) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_coalesced(&self) {
        self.coalesced_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_queue_depth(&self, depth: u64) {
        self.queue_depth.store(depth, Ordering::Relaxed);
    }

    pub fn set_scheduler_lag_ms(&self, lag: f64) {
        self.scheduler_lag_ms_bits
            .store(lag.to_bits(), Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> VenueHealth {
        let to_ts = |ms: i64| {
            if ms == 0 {
                None
            } else {
                DateTime::from_timestamp_millis(ms)
            }
        };
        VenueHealth {
            venue: self.venue.clone(),
            stream_connected: self.stream_connected.load(Ordering::Relaxed),
            rest_ok: self.rest_ok.load(Ordering::Relaxed),
            last_stream_msg_ts: to_ts(self.last_stream_msg_ms.load(Ordering::Relaxed)),
            last_rest_ts: to_ts(self.last_rest_ms.load(Ordering::Relaxed)),
            reconnect_count: self.reconnect_count.load(Ordering::Relaxed),
            error_rate: self.error_count.load(Ordering::Relaxed) as f64,
            queue_depth: self.queue_depth.load(Ordering::Relaxed),
            coalesced_count: self.coalesced_count.load(Ordering::Relaxed),
            scheduler_lag_ms: f64::from_bits(self.scheduler_lag_ms_bits.load(Ordering::Relaxed)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_requires_recent_activity_on_either_transport() {
        let state = VenueHealthState::new("binance");
        assert!(!state.snapshot().is_healthy(Utc::now()));

        state.mark_stream_message();
        assert!(state.snapshot().is_healthy(Utc::now()));
    }

    #[test]
    fn stale_stream_message_is_unhealthy() {
        let mut snap = VenueHealthState::new("binance").snapshot();
        snap.stream_connected = true;
        snap.last_stream_msg_ts = Some(Utc::now() - chrono::Duration::seconds(120));
        assert!(!snap.is_healthy(Utc::now()));
    }
}
