//! Health collector: periodically snapshots every registered venue's health
//! state, persists it, and logs an aggregated summary line.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::model::{VenueHealth, VenueHealthState};
use crate::persistence::{PersistenceWriter, Record};

/// Central registry of per-venue health state, shared by ingestion (which
/// writes) and the health collector (which reads).
#[derive(Default, Clone)]
pub struct HealthRegistry {
    venues: Arc<RwLock<HashMap<String, Arc<VenueHealthState>>>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the state for `venue`, creating it if this is the first time
    /// it's been seen.
    pub fn state_for(&self, venue: &str) -> Arc<VenueHealthState> {
        if let Some(state) = self.venues.read().get(venue) {
            return state.clone();
        }
        self.venues
            .write()
            .entry(venue.to_string())
            .or_insert_with(|| Arc::new(VenueHealthState::new(venue)))
            .clone()
    }

    pub fn snapshot_all(&self) -> Vec<VenueHealth> {
        self.venues.read().values().map(|s| s.snapshot()).collect()
    }
}

/// Summary line logged once per collection pass.
pub struct HealthSummary {
    pub total_venues: usize,
    pub healthy_venues: usize,
    pub unhealthy: Vec<String>,
}

pub fn summarize(snapshots: &[VenueHealth], now: chrono::DateTime<Utc>) -> HealthSummary {
    let unhealthy: Vec<String> = snapshots
        .iter()
        .filter(|s| !s.is_healthy(now))
        .map(|s| s.venue.clone())
        .collect();
    HealthSummary {
        total_venues: snapshots.len(),
        healthy_venues: snapshots.len() - unhealthy.len(),
        unhealthy,
    }
}

/// Runs the periodic collection loop until `shutdown` fires.
pub async fn run_health_collector(
    registry: HealthRegistry,
    writer: PersistenceWriter,
    interval: Duration,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                let now = Utc::now();
                let snapshots = registry.snapshot_all();
                let summary = summarize(&snapshots, now);

                for snap in &snapshots {
                    writer.append(Record::Health(snap.clone()));
                }

                if !summary.unhealthy.is_empty() {
                    warn!(venues = ?summary.unhealthy, "unhealthy venues detected");
                }
                info!(
                    total = summary.total_venues,
                    healthy = summary.healthy_venues,
                    "health summary"
                );
            }
        }
    }
    info!("health collector stopped");
}
