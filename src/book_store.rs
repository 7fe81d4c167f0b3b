//! Book Store: the single piece of shared mutable state between ingestion
//! and the scanners. A (venue, symbol) -> OrderBook map with a freshness
//! policy; writers replace entries atomically, readers never see a partial
//! snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::model::{OrderBook, Symbol};

pub const FRESHNESS_TTL: chrono::Duration = chrono::Duration::seconds(60);

/// Shared (venue, symbol) -> latest OrderBook map.
///
/// Each entry is an `ArcSwap<OrderBook>` so a read is a single atomic load of
/// an immutable snapshot (policy (b) in the concurrency model); the outer map
/// is guarded by a short-critical-section `RwLock` only for entry creation,
/// never for the hot read/update path.
#[derive(Default)]
pub struct BookStore {
    entries: RwLock<HashMap<(String, Symbol), Arc<ArcSwap<OrderBook>>>>,
}

impl BookStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a new snapshot for (venue, symbol), creating the slot if this
    /// is the first update for that pair.
    pub fn publish(&self, book: OrderBook) {
        let key = (book.venue.clone(), book.symbol.clone());
        let slot = {
            let existing = self.entries.read().get(&key).cloned();
            match existing {
                Some(slot) => slot,
                None => {
                    let mut entries = self.entries.write();
                    entries
                        .entry(key)
                        .or_insert_with(|| Arc::new(ArcSwap::from_pointee(book.clone())))
                        .clone()
                }
            }
        };
        slot.store(Arc::new(book));
    }

    /// Returns the latest snapshot for (venue, symbol) regardless of age.
    pub fn get(&self, venue: &str, symbol: &Symbol) -> Option<Arc<OrderBook>> {
        let key = (venue.to_string(), symbol.clone());
        self.entries.read().get(&key).map(|slot| slot.load_full())
    }

    /// Returns the latest snapshot only if it passes the freshness policy.
    pub fn get_fresh(&self, venue: &str, symbol: &Symbol, now: DateTime<Utc>) -> Option<Arc<OrderBook>> {
        self.get(venue, symbol)
            .filter(|book| book.is_fresh(now, FRESHNESS_TTL))
    }

    /// All (venue, OrderBook) pairs for `symbol` that are fresh and have both
    /// sides populated. Used by the cross-exchange scanner's per-symbol gather.
    pub fn fresh_venues_for_symbol(&self, symbol: &Symbol, now: DateTime<Utc>) -> Vec<(String, Arc<OrderBook>)> {
        self.entries
            .read()
            .iter()
            .filter(|((_, sym), _)| sym == symbol)
            .filter_map(|((venue, _), slot)| {
                let book = slot.load_full();
                (book.is_fresh(now, FRESHNESS_TTL) && book.has_both_sides())
                    .then(|| (venue.clone(), book))
            })
            .collect()
    }

    /// All symbols with at least one snapshot recorded for `venue`, fresh or
    /// not. The triangular scanner uses this as its candidate-asset universe
    /// when enumerating cycles.
    pub fn known_symbols_for_venue(&self, venue: &str) -> Vec<Symbol> {
        self.entries
            .read()
            .keys()
            .filter(|(v, _)| v == venue)
            .map(|(_, sym)| sym.clone())
            .collect()
    }

    /// All known venues (used by the triangular scanner to enumerate which
    /// venues currently have any book at all).
    pub fn known_venues(&self) -> Vec<String> {
        let mut venues: Vec<String> = self
            .entries
            .read()
            .keys()
            .map(|(venue, _)| venue.clone())
            .collect();
        venues.sort();
        venues.dedup();
        venues
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DepthLevel;

    fn book(venue: &str, symbol: Symbol, ts: DateTime<Utc>) -> OrderBook {
        OrderBook {
            venue: venue.to_string(),
            symbol,
            bids: vec![DepthLevel { price: 99.0, amount: 1.0 }],
            asks: vec![DepthLevel { price: 101.0, amount: 1.0 }],
            timestamp: ts,
            nonce: None,
        }
    }

    #[test]
    fn publish_then_get_returns_latest() {
        let store = BookStore::new();
        let symbol = Symbol::new("BTC", "USDT").unwrap();
        store.publish(book("binance", symbol.clone(), Utc::now()));
        assert!(store.get("binance", &symbol).is_some());

        let newer = book("binance", symbol.clone(), Utc::now());
        store.publish(newer.clone());
        let got = store.get("binance", &symbol).unwrap();
        assert_eq!(got.timestamp, newer.timestamp);
    }

    #[test]
    fn stale_entry_is_rejected_by_get_fresh() {
        let store = BookStore::new();
        let symbol = Symbol::new("BTC", "USDT").unwrap();
        store.publish(book("binance", symbol.clone(), Utc::now() - chrono::Duration::seconds(120)));
        assert!(store.get_fresh("binance", &symbol, Utc::now()).is_none());
    }

    #[test]
    fn fresh_venues_for_symbol_filters_other_symbols() {
        let store = BookStore::new();
        let btc = Symbol::new("BTC", "USDT").unwrap();
        let eth = Symbol::new("ETH", "USDT").unwrap();
        store.publish(book("binance", btc.clone(), Utc::now()));
        store.publish(book("okx", btc.clone(), Utc::now()));
        store.publish(book("binance", eth, Utc::now()));

        let venues = store.fresh_venues_for_symbol(&btc, Utc::now());
        assert_eq!(venues.len(), 2);
    }
}
