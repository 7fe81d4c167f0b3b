//! Process entry point: wires the shared state, the scanners, the alert
//! pipeline, the persistence writer and the health collector together, then
//! waits for a shutdown signal.
//!
//! Venue connectors are venue-specific and constructed by the operator
//! (exchange discovery and market-metadata loading are outside this crate's
//! scope); this binary only demonstrates the detection pipeline around
//! whatever books end up in the [`BookStore`].

use std::sync::Arc;

use anyhow::Context;
use arb_pipeline::alert::{AlertPipeline, LoggingSink};
use arb_pipeline::book_store::BookStore;
use arb_pipeline::config::Config;
use arb_pipeline::fees::{FeeModel, NoPublicFees};
use arb_pipeline::health::{run_health_collector, HealthRegistry};
use arb_pipeline::persistence::{InMemorySink, PersistenceWriter, Record};
use arb_pipeline::scanners::{CrossScanner, TriangularScanner};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Arc::new(Config::from_env());

    let filter = tracing_subscriber::EnvFilter::try_new(&config.log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(
        symbols = config.symbol_universe.len(),
        exchanges = config.include_exchanges.len(),
        "starting arbitrage pipeline"
    );

    let overrides = FeeModel::scan_env_overrides();
    if !overrides.is_empty() {
        info!(count = overrides.len(), "fee overrides present in environment");
    }

    let store = Arc::new(BookStore::new());
    let fees = Arc::new(FeeModel::new());
    for venue in &config.include_exchanges {
        fees.resolve(venue, &NoPublicFees).await;
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let persistence_sink = Arc::new(InMemorySink::new());
    let (writer, persistence_task) = PersistenceWriter::new(persistence_sink, shutdown_rx.clone());

    let health_registry = HealthRegistry::new();
    for venue in &config.include_exchanges {
        health_registry.state_for(venue);
    }
    let health_task = run_health_collector(
        health_registry,
        writer.clone(),
        std::time::Duration::from_secs(config.health_check_interval_s),
        shutdown_rx.clone(),
    );

    let (alerts, alert_task) = AlertPipeline::new(
        Arc::new(LoggingSink),
        std::time::Duration::from_secs(config.dedup_ttl_s),
        std::time::Duration::from_millis(config.min_send_interval_ms),
        shutdown_rx.clone(),
    );

    let cross_scanner = Arc::new(CrossScanner::new(store.clone(), fees.clone(), config.clone()));
    let tri_scanner = Arc::new(TriangularScanner::new(store.clone(), fees.clone(), config.clone()));

    let cross_alerts = alerts.clone();
    let cross_writer = writer.clone();
    let cross_task = cross_scanner.run(shutdown_rx.clone(), move |opps| {
        for opp in &opps {
            cross_alerts.notify_cross(opp);
            cross_writer.append(Record::Cross(opp.clone()));
        }
    });

    let tri_alerts = alerts.clone();
    let tri_writer = writer.clone();
    let tri_task = tri_scanner.run(shutdown_rx.clone(), move |opps| {
        for opp in &opps {
            tri_alerts.notify_tri(opp);
            tri_writer.append(Record::Tri(opp.clone()));
        }
    });

    let persistence_handle = tokio::spawn(persistence_task);
    let health_handle = tokio::spawn(health_task);
    let alert_handle = tokio::spawn(alert_task);
    let cross_handle = tokio::spawn(cross_task);
    let tri_handle = tokio::spawn(tri_task);

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);

    let (cross_result, tri_result, alert_result, health_result, persistence_result) =
        tokio::join!(cross_handle, tri_handle, alert_handle, health_handle, persistence_handle);
    cross_result.context("cross-exchange scanner task panicked")?;
    tri_result.context("triangular scanner task panicked")?;
    alert_result.context("alert consumer task panicked")?;
    health_result.context("health collector task panicked")?;
    persistence_result.context("persistence writer task panicked")?;

    Ok(())
}
