//! Cross-exchange opportunity detector: same symbol, different venues.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info};

use crate::book_store::BookStore;
use crate::config::Config;
use crate::depth::calculate_vwap;
use crate::fees::FeeModel;
use crate::model::{CrossOpportunity, DetectionMode, Fees};

/// Scans every configured symbol for cross-exchange opportunities, reading a
/// consistent view of the Book Store on each pass.
pub struct CrossScanner {
    store: Arc<BookStore>,
    fees: Arc<FeeModel>,
    config: Arc<Config>,
}

impl CrossScanner {
    pub fn new(store: Arc<BookStore>, fees: Arc<FeeModel>, config: Arc<Config>) -> Self {
        Self { store, fees, config }
    }

    /// One full pass over the symbol universe. Returns every opportunity
    /// found; the caller is responsible for feeding them to the alert
    /// pipeline and the persistence sink.
    pub fn scan_once(&self) -> Vec<CrossOpportunity> {
        let now = Utc::now();
        let mut found = Vec::new();

        for symbol in &self.config.symbol_universe {
            let venues = self.store.fresh_venues_for_symbol(symbol, now);
            if venues.len() < 2 {
                continue;
            }

            for i in 0..venues.len() {
                for j in 0..venues.len() {
                    if i == j {
                        continue;
                    }
                    let (buy_venue, buy_book) = &venues[i];
                    let (sell_venue, sell_book) = &venues[j];

                    let Some(buy_fees) = self.fees.cached(buy_venue) else {
                        continue;
                    };
                    let Some(sell_fees) = self.fees.cached(sell_venue) else {
                        continue;
                    };

                    if let Some(opp) = check_pair(
                        &symbol.to_string(),
                        buy_venue,
                        sell_venue,
                        &buy_book.asks,
                        &sell_book.bids,
                        self.config.min_notional,
                        self.config.min_spread_bps,
                        &buy_fees,
                        &sell_fees,
                        mode_for(
                            buy_book.timestamp,
                            sell_book.timestamp,
                            now,
                            self.config.stream_mode_age_threshold_s,
                        ),
                    ) {
                        found.push(opp);
                    }
                }
            }
        }

        found
    }

    /// Runs the adaptive scan loop until `shutdown` fires, invoking
    /// `on_opportunities` after every pass.
    pub async fn run(
        self: Arc<Self>,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
        on_opportunities: impl Fn(Vec<CrossOpportunity>) + Send + 'static,
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
                        debug!(count = found.len(), "cross-exchange scan found opportunities");
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
        info!("cross-exchange scanner stopped");
    }
}

fn mode_for(
    buy_ts: chrono::DateTime<Utc>,
    sell_ts: chrono::DateTime<Utc>,
    now: chrono::DateTime<Utc>,
    threshold_s: i64,
) -> DetectionMode {
    let threshold = chrono::Duration::seconds(threshold_s);
    if (now - buy_ts) <= threshold && (now - sell_ts) <= threshold {
        DetectionMode::Stream
    } else {
        DetectionMode::Poll
    }
}

#[allow(clippy::too_many_arguments)]
fn check_pair(
    symbol: &str,
    buy_venue: &str,
    sell_venue: &str,
    buy_asks: &[crate::model::DepthLevel],
    sell_bids: &[crate::model::DepthLevel],
    min_notional: f64,
    min_spread_bps: f64,
    buy_fees: &Fees,
    sell_fees: &Fees,
    mode: DetectionMode,
) -> Option<CrossOpportunity> {
    let buy_vwap = calculate_vwap(buy_asks, min_notional);
    let sell_vwap = calculate_vwap(sell_bids, min_notional);

    if !buy_vwap.fully_filled || !sell_vwap.fully_filled {
        return None;
    }

    let (_, buy_taker) = buy_fees.get(Some(symbol));
    let (_, sell_taker) = sell_fees.get(Some(symbol));

    let buy_after = buy_vwap.vwap_price * (1.0 + buy_taker);
    let sell_after = sell_vwap.vwap_price * (1.0 - sell_taker);

    if sell_after <= buy_after {
        return None;
    }

    let mid = (buy_after + sell_after) / 2.0;
    let spread_bps = (sell_after - buy_after) / mid * 10_000.0;

    if spread_bps < min_spread_bps {
        return None;
    }

    Some(CrossOpportunity {
        symbol: symbol.to_string(),
        buy_venue: buy_venue.to_string(),
        sell_venue: sell_venue.to_string(),
        buy_price_before: buy_vwap.vwap_price,
        sell_price_before: sell_vwap.vwap_price,
        buy_price_after: buy_after,
        sell_price_after: sell_after,
        spread_bps,
        notional: min_notional,
        buy_levels_used: buy_vwap.levels_used,
        sell_levels_used: sell_vwap.levels_used,
        buy_fees: buy_fees.get(Some(symbol)),
        sell_fees: sell_fees.get(Some(symbol)),
        detection_ts: Utc::now(),
        mode,
    })
}
