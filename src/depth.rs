//! Depth / VWAP primitive.
//!
//! Pure and deterministic: given a sorted book side and a target notional,
//! sweep levels from the best price outward, partially filling the level at
//! which the cumulative notional first reaches the target. Shared by both
//! scanners; neither scanner re-implements the walk.

use crate::model::DepthLevel;

/// Result of sweeping one side of a book for a target notional.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VwapResult {
    pub vwap_price: f64,
    pub total_volume: f64,
    pub levels_used: usize,
    pub fully_filled: bool,
}

impl VwapResult {
    fn empty() -> Self {
        Self {
            vwap_price: 0.0,
            total_volume: 0.0,
            levels_used: 0,
            fully_filled: false,
        }
    }
}

/// Sweeps `levels` (already sorted best-price-first by the caller) to fill
/// `target_notional` quote units.
pub fn calculate_vwap(levels: &[DepthLevel], target_notional: f64) -> VwapResult {
    if levels.is_empty() || target_notional <= 0.0 {
        return VwapResult::empty();
    }

    let mut cum_notional = 0.0;
    let mut cum_amount = 0.0;

    for (k, level) in levels.iter().enumerate() {
        let level_notional = level.notional();
        if cum_notional + level_notional >= target_notional {
            let remaining = target_notional - cum_notional;
            let fill_amount = remaining / level.price;
            let total_notional = cum_notional + remaining;
            let total_amount = cum_amount + fill_amount;
            return VwapResult {
                vwap_price: total_notional / total_amount,
                total_volume: total_amount,
                levels_used: k + 1,
                fully_filled: true,
            };
        }
        cum_notional += level_notional;
        cum_amount += level.amount;
    }

    VwapResult {
        vwap_price: cum_notional / cum_amount,
        total_volume: cum_amount,
        levels_used: levels.len(),
        fully_filled: false,
    }
}

/// VWAP for a buy, sweeping asks.
pub fn calculate_buy_vwap(asks: &[DepthLevel], target_notional: f64) -> VwapResult {
    calculate_vwap(asks, target_notional)
}

/// VWAP for a sell, sweeping bids.
pub fn calculate_sell_vwap(bids: &[DepthLevel], target_notional: f64) -> VwapResult {
    calculate_vwap(bids, target_notional)
}

/// Effective price after taker fees: buy_after = vwap*(1+fee); sell_after = vwap*(1-fee).
pub fn effective_price_after_fees(vwap: f64, taker_fee: f64, side: crate::model::Side) -> f64 {
    match side {
        crate::model::Side::Buy => vwap * (1.0 + taker_fee),
        crate::model::Side::Sell => vwap * (1.0 - taker_fee),
    }
}

/// Cheap pre-filter: does the full side hold enough notional at all, without
/// doing the weighted walk. Scanners use this before calling [`calculate_vwap`].
pub fn sufficient_depth(levels: &[DepthLevel], target_notional: f64) -> bool {
    levels.iter().map(DepthLevel::notional).sum::<f64>() >= target_notional
}

/// Slippage of the VWAP fill relative to the best price, in bps. Telemetry
/// only; never used in threshold decisions.
pub fn slippage_bps(vwap_price: f64, best_price: f64) -> f64 {
    if best_price <= 0.0 {
        return 0.0;
    }
    ((vwap_price / best_price) - 1.0).abs() * 10_000.0
}
