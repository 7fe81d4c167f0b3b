//! Detected arbitrage opportunities: the output of the two scanners.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", if *self == Side::Buy { "buy" } else { "sell" })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DetectionMode {
    Stream,
    Poll,
}

impl std::fmt::Display for DetectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", if *self == DetectionMode::Stream { "stream" } else { "poll" })
    }
}

/// A cross-exchange arbitrage opportunity: buy on one venue, sell on another.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrossOpportunity {
    pub symbol: String,
    pub buy_venue: String,
    pub sell_venue: String,
    pub buy_price_before: f64,
    pub sell_price_before: f64,
    pub buy_price_after: f64,
    pub sell_price_after: f64,
    pub spread_bps: f64,
    pub notional: f64,
    pub buy_levels_used: usize,
    pub sell_levels_used: usize,
    pub buy_fees: (f64, f64),
    pub sell_fees: (f64, f64),
    pub detection_ts: DateTime<Utc>,
    pub mode: DetectionMode,
}

impl CrossOpportunity {
    /// `CROSS|buy_venue|sell_venue|symbol|floor(notional)`
    pub fn dedup_key(&self) -> String {
        format!(
            "CROSS|{}|{}|{}|{}",
            self.buy_venue,
            self.sell_venue,
            self.symbol,
            self.notional.floor() as i64
        )
    }
}

/// One leg of a triangular cycle.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Leg {
    pub symbol: String,
    pub price: f64,
    pub side: Side,
}

/// A triangular (intra-exchange, three-leg) arbitrage opportunity.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TriOpportunity {
    pub venue: String,
    pub base_asset: String,
    pub cycle: (String, String, String),
    pub start_amount: f64,
    pub end_amount: f64,
    pub gain_bps: f64,
    pub notional: f64,
    pub leg1: Leg,
    pub leg2: Leg,
    pub leg3: Leg,
    pub fees: (f64, f64),
    pub detection_ts: DateTime<Utc>,
}

impl TriOpportunity {
    /// `TRI|venue|base|a2|a3|floor(notional)`
    pub fn dedup_key(&self) -> String {
        format!(
            "TRI|{}|{}|{}|{}|{}",
            self.venue,
            self.cycle.0,
            self.cycle.1,
            self.cycle.2,
            self.notional.floor() as i64
        )
    }
}
