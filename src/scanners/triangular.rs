//! Triangular opportunity detector: a 3-leg cycle through a single venue's
//! order books, e.g. USDT -> BTC -> ETH -> USDT.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::book_store::BookStore;
use crate::config::Config;
use crate::depth::calculate_vwap;
use crate::fees::FeeModel;
use crate::model::{Fees, Leg, Side, Symbol, TriOpportunity};

const PATH_CACHE_TTL: Duration = Duration::from_secs(300);

/// A candidate 3-asset cycle: base -> a2 -> a3 -> base.
pub type Cycle = (String, String, String);

/// Per-venue cache of candidate cycles, so every scan pass doesn't re-derive
/// the asset universe from the Book Store.
#[derive(Default)]
pub struct PathCache {
    entries: Mutex<HashMap<String, (Instant, Vec<Cycle>)>>,
}

impl PathCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached cycles for `venue` if still within the TTL,
    /// otherwise recomputes via `build` and caches the result.
    pub fn get_or_build(&self, venue: &str, now: Instant, build: impl FnOnce() -> Vec<Cycle>) -> Vec<Cycle> {
        let mut entries = self.entries.lock();
        if let Some((built_at, cycles)) = entries.get(venue) {
            if now.duration_since(*built_at) < PATH_CACHE_TTL {
                return cycles.clone();
            }
        }
        let cycles = build();
        entries.insert(venue.to_string(), (now, cycles.clone()));
        cycles
    }
}

/// Whether a (from, to) hop can be resolved directly or inversely against the
/// symbols a venue currently has books for, and which side of the book that
/// hop reads.
enum Hop {
    /// `from/to` exists: sell `from` into `to`, reading bids.
    Direct(Symbol),
    /// `to/from` exists: buy `to` with `from`, reading asks.
    Inverse(Symbol),
}

fn resolve_hop(known: &[Symbol], from: &str, to: &str) -> Option<Hop> {
    if let Some(sym) = known.iter().find(|s| s.base == from && s.quote == to) {
        return Some(Hop::Direct(sym.clone()));
    }
    if let Some(sym) = known.iter().find(|s| s.base == to && s.quote == from) {
        return Some(Hop::Inverse(sym.clone()));
    }
    None
}

/// Enumerates every (base, a2, a3) cycle reachable through 3 hops using only
/// symbols the Book Store currently carries for `venue`, restricted to bases
/// in `tri_bases` and excluding any asset in `tri_exclude_quotes` as a2/a3.
/// Sorted lexicographically for determinism.
pub fn candidate_paths(known: &[Symbol], tri_bases: &[String], tri_exclude_quotes: &[String]) -> Vec<Cycle> {
    let mut assets: Vec<String> = known
        .iter()
        .flat_map(|s| [s.base.clone(), s.quote.clone()])
        .collect();
    assets.sort();
    assets.dedup();

    let mut cycles = Vec::new();
    for base in tri_bases {
        if !assets.contains(base) {
            continue;
        }
        for a2 in &assets {
            if a2 == base || tri_exclude_quotes.contains(a2) {
                continue;
            }
            if resolve_hop(known, base, a2).is_none() {
                continue;
            }
            for a3 in &assets {
                if a3 == base || a3 == a2 || tri_exclude_quotes.contains(a3) {
                    continue;
                }
                if resolve_hop(known, a2, a3).is_none() {
                    continue;
                }
                if resolve_hop(known, a3, base).is_none() {
                    continue;
                }
                cycles.push((base.clone(), a2.clone(), a3.clone()));
            }
        }
    }
    cycles.sort();
    cycles
}

/// Simulates one hop of the cycle: converts `amount` units of `from` into
/// `to`, applying the taker fee, and returns (received, leg, levels_used) or
/// `None` if the relevant book side can't fill the notional.
fn execute_leg(
    store: &BookStore,
    venue: &str,
    from: &str,
    to: &str,
    amount: f64,
    taker: f64,
    now: chrono::DateTime<Utc>,
) -> Option<(f64, Leg)> {
    match resolve_hop(&store.known_symbols_for_venue(venue), from, to)? {
        Hop::Direct(symbol) => {
            let book = store.get_fresh(venue, &symbol, now)?;
            if book.bids.is_empty() {
                return None;
            }
            let best_bid = book.bids[0].price;
            let target_notional = amount * best_bid;
            let vwap = calculate_vwap(&book.bids, target_notional);
            if !vwap.fully_filled {
                return None;
            }
            let received = vwap.total_volume * vwap.vwap_price * (1.0 - taker);
            Some((
                received,
                Leg {
                    symbol: symbol.to_string(),
                    price: vwap.vwap_price,
                    side: Side::Sell,
                },
            ))
        }
        Hop::Inverse(symbol) => {
            let book = store.get_fresh(venue, &symbol, now)?;
            if book.asks.is_empty() {
                return None;
            }
            let vwap = calculate_vwap(&book.asks, amount);
            if !vwap.fully_filled {
                return None;
            }
            let received = (amount / vwap.vwap_price) * (1.0 - taker);
            Some((
                received,
                Leg {
                    symbol: symbol.to_string(),
                    price: vwap.vwap_price,
                    side: Side::Buy,
                },
            ))
        }
    }
}

/// Scans every venue's candidate cycles for triangular opportunities, reading
/// a consistent view of the Book Store on each pass.
pub struct TriangularScanner {
    store: Arc<BookStore>,
    fees: Arc<FeeModel>,
    config: Arc<Config>,
    paths: PathCache,
}

impl TriangularScanner {
    pub fn new(store: Arc<BookStore>, fees: Arc<FeeModel>, config: Arc<Config>) -> Self {
        Self { store, fees, config, paths: PathCache::new() }
    }

    pub fn scan_once(&self) -> Vec<TriOpportunity> {
        let now = Utc::now();
        let inst = Instant::now();
        let mut found = Vec::new();

        for venue in self.store.known_venues() {
            let Some(fees) = self.fees.cached(&venue) else {
                continue;
            };
            let known = self.store.known_symbols_for_venue(&venue);
            let cycles = self.paths.get_or_build(&venue, inst, || {
                candidate_paths(&known, &self.config.tri_bases, &self.config.tri_exclude_quotes)
            });

            for (base, a2, a3) in cycles {
                if let Some(opp) = simulate_cycle(
                    &self.store,
                    &venue,
                    &base,
                    &a2,
                    &a3,
                    self.config.min_notional,
                    self.config.min_tri_gain_bps,
                    &fees,
                    now,
                ) {
                    found.push(opp);
                }
            }
        }

        found
    }

    pub async fn run(
        self: Arc<Self>,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
        on_opportunities: impl Fn(Vec<TriOpportunity>) + Send + 'static,
    ) {
        let base_interval = self.config.scan_interval();
        let mut sleep_for = base_interval;

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
                _ = tokio::time::sleep(sleep_for) => {
                    let start = Instant::now();
                    let found = self.scan_once();
                    if !found.is_empty() {
                        debug!(count = found.len(), "triangular scan found opportunities");
                    }
                    on_opportunities(found);

                    let elapsed = start.elapsed();
                    sleep_for = if elapsed > base_interval {
                        Duration::from_secs_f64(base_interval.as_secs_f64() * 1.5)
                    } else {
                        base_interval
                    };
                }
            }
        }
        info!("triangular scanner stopped");
    }
}

#[allow(clippy::too_many_arguments)]
fn simulate_cycle(
    store: &BookStore,
    venue: &str,
    base: &str,
    a2: &str,
    a3: &str,
    start_amount: f64,
    min_gain_bps: f64,
    fees: &Fees,
    now: chrono::DateTime<Utc>,
) -> Option<TriOpportunity> {
    let taker = fees.taker_for(None);

    let (amount2, leg1) = execute_leg(store, venue, base, a2, start_amount, taker, now)?;
    let (amount3, leg2) = execute_leg(store, venue, a2, a3, amount2, taker, now)?;
    let (end_amount, leg3) = execute_leg(store, venue, a3, base, amount3, taker, now)?;

    let gain_bps = (end_amount - start_amount) / start_amount * 10_000.0;
    if gain_bps < min_gain_bps {
        return None;
    }

    Some(TriOpportunity {
        venue: venue.to_string(),
        base_asset: base.to_string(),
        cycle: (base.to_string(), a2.to_string(), a3.to_string()),
        start_amount,
        end_amount,
        gain_bps,
        notional: start_amount,
        leg1,
        leg2,
        leg3,
        fees: fees.get(None),
        detection_ts: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DepthLevel, FeeSource, OrderBook};

    fn book(venue: &str, symbol: Symbol, bids: Vec<(f64, f64)>, asks: Vec<(f64, f64)>) -> OrderBook {
        OrderBook {
            venue: venue.to_string(),
            symbol,
            bids: bids.into_iter().map(|(price, amount)| DepthLevel { price, amount }).collect(),
            asks: asks.into_iter().map(|(price, amount)| DepthLevel { price, amount }).collect(),
            timestamp: Utc::now(),
            nonce: None,
        }
    }

    #[test]
    fn candidate_paths_requires_all_three_hops_present() {
        let known = vec![
            Symbol::new("BTC", "USDT").unwrap(),
            Symbol::new("ETH", "BTC").unwrap(),
            Symbol::new("ETH", "USDT").unwrap(),
        ];
        let cycles = candidate_paths(&known, &["USDT".to_string()], &[]);
        assert_eq!(cycles, vec![("USDT".to_string(), "BTC".to_string(), "ETH".to_string())]);
    }

    #[test]
    fn scenario_triangular_round_trip_gain() {
        // USDT -> BTC -> ETH -> USDT, ~40bps gain, no fees for clarity.
        let store = BookStore::new();
        let btc_usdt = Symbol::new("BTC", "USDT").unwrap();
        let eth_btc = Symbol::new("ETH", "BTC").unwrap();
        let eth_usdt = Symbol::new("ETH", "USDT").unwrap();

        // Buy BTC with USDT: ask 50000.
        store.publish(book("venueA", btc_usdt, vec![(49990.0, 10.0)], vec![(50000.0, 10.0)]));
        // Sell ETH for BTC: bid side used inversely (buy ETH with BTC -> ask).
        store.publish(book("venueA", eth_btc, vec![(0.0312, 10.0)], vec![(0.03125, 10.0)]));
        // Sell ETH for USDT: bid 1608.
        store.publish(book("venueA", eth_usdt, vec![(1608.0, 10.0)], vec![(1609.0, 10.0)]));

        let fees = Fees::new("venueA", 0.0, 0.0, FeeSource::Default);

        let opp = simulate_cycle(&store, "venueA", "USDT", "BTC", "ETH", 1000.0, 1.0, &fees, Utc::now());
        assert!(opp.is_some());
        let opp = opp.unwrap();
        assert!(opp.gain_bps > 0.0);
    }

    #[test]
    fn below_threshold_cycle_is_rejected() {
        let store = BookStore::new();
        let btc_usdt = Symbol::new("BTC", "USDT").unwrap();
        let eth_btc = Symbol::new("ETH", "BTC").unwrap();
        let eth_usdt = Symbol::new("ETH", "USDT").unwrap();

        store.publish(book("venueA", btc_usdt, vec![(49999.0, 10.0)], vec![(50000.0, 10.0)]));
        store.publish(book("venueA", eth_btc, vec![(0.031999, 10.0)], vec![(0.032, 10.0)]));
        store.publish(book("venueA", eth_usdt, vec![(1599.9, 10.0)], vec![(1600.0, 10.0)]));

        let fees = Fees::new("venueA", 0.0, 0.001, FeeSource::Default);
        let opp = simulate_cycle(&store, "venueA", "USDT", "BTC", "ETH", 1000.0, 1000.0, &fees, Utc::now());
        assert!(opp.is_none());
    }
}
