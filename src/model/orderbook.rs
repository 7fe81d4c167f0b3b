//! Order book snapshots: the one entity all downstream code operates on once
//! a venue payload has been parsed.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::symbol::Symbol;

/// A single resting price level. Invalid (non-positive) levels never make it
/// this far; they're rejected at the parser boundary.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DepthLevel {
    pub price: f64,
    pub amount: f64,
}

impl DepthLevel {
    pub fn notional(&self) -> f64 {
        self.price * self.amount
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum OrderBookError {
    #[error("level at index {index} has non-positive price or amount")]
    InvalidLevel { index: usize },
    #[error("crossed book: best_bid {best_bid} >= best_ask {best_ask}")]
    Crossed { best_bid: f64, best_ask: f64 },
}

/// A consistent view of the top N bids and asks for (venue, symbol) at one instant.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct OrderBook {
    pub venue: String,
    pub symbol: Symbol,
    /// Descending by price.
    pub bids: Vec<DepthLevel>,
    /// Ascending by price.
    pub asks: Vec<DepthLevel>,
    pub timestamp: DateTime<Utc>,
    pub nonce: Option<u64>,
}

impl OrderBook {
    /// Builds a book from raw (unsorted, possibly invalid) level pairs, sorting
    /// and validating per the ingest-time invariants. Levels with non-positive
    /// price or amount are dropped silently (malformed-data policy, not a hard
    /// reject of the whole snapshot) before the crossed-book check runs.
    pub fn from_raw_levels(
        venue: impl Into<String>,
        symbol: Symbol,
        raw_bids: &[(f64, f64)],
        raw_asks: &[(f64, f64)],
        timestamp: DateTime<Utc>,
        nonce: Option<u64>,
    ) -> Result<Self, OrderBookError> {
        let mut bids: Vec<DepthLevel> = raw_bids
            .iter()
            .filter(|(p, a)| *p > 0.0 && *a > 0.0)
            .map(|(price, amount)| DepthLevel {
                price: *price,
                amount: *amount,
            })
            .collect();
        let mut asks: Vec<DepthLevel> = raw_asks
            .iter()
            .filter(|(p, a)| *p > 0.0 && *a > 0.0)
            .map(|(price, amount)| DepthLevel {
                price: *price,
                amount: *amount,
            })
            .collect();

        bids.sort_by(|a, b| b.price.partial_cmp(&a.price).unwrap());
        asks.sort_by(|a, b| a.price.partial_cmp(&b.price).unwrap());

        if let (Some(best_bid), Some(best_ask)) = (bids.first(), asks.first()) {
            if best_bid.price >= best_ask.price {
                return Err(OrderBookError::Crossed {
                    best_bid: best_bid.price,
                    best_ask: best_ask.price,
                });
            }
        }

        Ok(Self {
            venue: venue.into(),
            symbol,
            bids,
            asks,
            timestamp,
            nonce,
        })
    }

    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.timestamp
    }

    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        self.age(now) <= ttl && self.age(now) >= chrono::Duration::zero()
    }

    pub fn has_both_sides(&self) -> bool {
        !self.bids.is_empty() && !self.asks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sym() -> Symbol {
        Symbol::new("BTC", "USDT").unwrap()
    }

    #[test]
    fn sorts_and_drops_invalid_levels() {
        let book = OrderBook::from_raw_levels(
            "binance",
            sym(),
            &[(99.0, 1.0), (0.0, 5.0), (100.0, 1.0)],
            &[(101.0, 1.0), (-1.0, 2.0), (102.0, 1.0)],
            Utc::now(),
            None,
        )
        .unwrap();
        assert_eq!(book.bids[0].price, 100.0);
        assert_eq!(book.bids[1].price, 99.0);
        assert_eq!(book.asks[0].price, 101.0);
        assert_eq!(book.asks.len(), 2);
    }

    #[test]
    fn rejects_crossed_book() {
        let err = OrderBook::from_raw_levels(
            "binance",
            sym(),
            &[(105.0, 1.0)],
            &[(100.0, 1.0)],
            Utc::now(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, OrderBookError::Crossed { .. }));
    }

    #[test]
    fn freshness_window() {
        let old = OrderBook::from_raw_levels(
            "binance",
            sym(),
            &[(99.0, 1.0)],
            &[(101.0, 1.0)],
            Utc::now() - Duration::seconds(61),
            None,
        )
        .unwrap();
        assert!(!old.is_fresh(Utc::now(), Duration::seconds(60)));
    }
}
