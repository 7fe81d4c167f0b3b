//! End-to-end exercise of coalesce -> book store -> scan for both detectors,
//! without any real venue connector: synthetic books are published directly.

use std::sync::Arc;
use std::time::Duration;

use arb_pipeline::book_store::BookStore;
use arb_pipeline::coalescer::{run_coalescer, CoalesceQueue};
use arb_pipeline::config::Config;
use arb_pipeline::fees::{FeeModel, NoPublicFees};
use arb_pipeline::model::{DepthLevel, OrderBook, Symbol, VenueHealthState};
use arb_pipeline::scanners::{CrossScanner, TriangularScanner};

fn book(venue: &str, symbol: Symbol, bids: Vec<(f64, f64)>, asks: Vec<(f64, f64)>) -> OrderBook {
    OrderBook {
        venue: venue.to_string(),
        symbol,
        bids: bids.into_iter().map(|(price, amount)| DepthLevel { price, amount }).collect(),
        asks: asks.into_iter().map(|(price, amount)| DepthLevel { price, amount }).collect(),
        timestamp: chrono::Utc::now(),
        nonce: None,
    }
}

#[tokio::test]
async fn coalescer_then_cross_scanner_finds_a_spread() {
    let store = Arc::new(BookStore::new());
    let queue = Arc::new(CoalesceQueue::new());
    let health = Arc::new(VenueHealthState::new("binance"));
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let symbol = Symbol::new("BTC", "USDT").unwrap();
    queue.push(book("binance", symbol.clone(), vec![(49990.0, 2.0)], vec![(50000.0, 2.0)]));

    let coalescer_handle = tokio::spawn(run_coalescer(
        queue.clone(),
        store.clone(),
        health,
        Duration::from_millis(5),
        shutdown_rx.clone(),
    ));

    // Second venue, published directly (as if already coalesced).
    store.publish(book("okx", symbol.clone(), vec![(50300.0, 2.0)], vec![(50310.0, 2.0)]));

    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown_tx.send(true).unwrap();
    coalescer_handle.await.unwrap();

    assert!(store.get("binance", &symbol).is_some());

    let fees = Arc::new(FeeModel::new());
    fees.resolve("binance", &NoPublicFees).await;
    fees.resolve("okx", &NoPublicFees).await;

    let mut config = Config::default();
    config.symbol_universe = vec![symbol];
    config.min_notional = 100.0;
    config.min_spread_bps = 10.0;
    let config = Arc::new(config);

    let scanner = CrossScanner::new(store, fees, config);
    let found = scanner.scan_once();
    assert!(!found.is_empty());
    assert_eq!(found[0].symbol, "BTC/USDT");
}

#[tokio::test]
async fn triangular_scanner_finds_a_round_trip_on_a_single_venue() {
    let store = Arc::new(BookStore::new());
    let venue = "binance";

    store.publish(book(venue, Symbol::new("BTC", "USDT").unwrap(), vec![(49990.0, 10.0)], vec![(50000.0, 10.0)]));
    store.publish(book(venue, Symbol::new("ETH", "BTC").unwrap(), vec![(0.0312, 10.0)], vec![(0.03125, 10.0)]));
    store.publish(book(venue, Symbol::new("ETH", "USDT").unwrap(), vec![(1608.0, 10.0)], vec![(1609.0, 10.0)]));

    let fees = Arc::new(FeeModel::new());
    fees.resolve(venue, &NoPublicFees).await;

    let mut config = Config::default();
    config.tri_bases = vec!["USDT".to_string()];
    config.min_tri_gain_bps = 1.0;
    config.min_notional = 1000.0;
    let config = Arc::new(config);

    let scanner = TriangularScanner::new(store, fees, config);
    let found = scanner.scan_once();
    assert!(found.iter().any(|opp| opp.venue == venue && opp.cycle.0 == "USDT"));
}
