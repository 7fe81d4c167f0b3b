//! Plain-ASCII alert message formatting. One template per opportunity kind,
//! each a newline-separated block; no external transport detail leaks in
//! here.

use crate::model::{CrossOpportunity, Leg, TriOpportunity};

pub fn format_cross(opp: &CrossOpportunity) -> String {
    format!(
        "[ARB] {} {} -> {}\n\
         Spread: {:.2}bps | Notional: {:.2}\n\
         Buy@{:.6} / Sell@{:.6}\n\
         Depth: buy {} / sell {} levels | Fees: buy maker {:.4}/taker {:.4}, sell maker {:.4}/taker {:.4} | Mode: {}\n\
         {}",
        opp.symbol,
        opp.buy_venue,
        opp.sell_venue,
        opp.spread_bps,
        opp.notional,
        opp.buy_price_after,
        opp.sell_price_after,
        opp.buy_levels_used,
        opp.sell_levels_used,
        opp.buy_fees.0,
        opp.buy_fees.1,
        opp.sell_fees.0,
        opp.sell_fees.1,
        opp.mode,
        opp.detection_ts.format("%H:%M:%S UTC"),
    )
}

fn format_leg(leg: &Leg) -> String {
    format!("{} @ {:.6}", leg.symbol, leg.price)
}

pub fn format_tri(opp: &TriOpportunity) -> String {
    format!(
        "[TRI] {} {} cycle: {} -> {} -> {} -> {}\n\
         Gain: {:.2}bps | Start: {:.4} {} -> End: {:.4} {}\n\
         Leg1 {} | Leg2 {} | Leg3 {}\n\
         Notional: {:.2} | Fees: maker {:.4}/taker {:.4}\n\
         {}",
        opp.venue,
        opp.base_asset,
        opp.cycle.0,
        opp.cycle.1,
        opp.cycle.2,
        opp.cycle.0,
        opp.gain_bps,
        opp.start_amount,
        opp.base_asset,
        opp.end_amount,
        opp.base_asset,
        format_leg(&opp.leg1),
        format_leg(&opp.leg2),
        format_leg(&opp.leg3),
        opp.notional,
        opp.fees.0,
        opp.fees.1,
        opp.detection_ts.format("%H:%M:%S UTC"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DetectionMode, Side};
    use chrono::Utc;

    fn cross() -> CrossOpportunity {
        CrossOpportunity {
            symbol: "BTC/USDT".into(),
            buy_venue: "binance".into(),
            sell_venue: "okx".into(),
            buy_price_before: 50_000.0,
            sell_price_before: 50_200.0,
            buy_price_after: 50_050.0,
            sell_price_after: 50_149.8,
            spread_bps: 19.9,
            notional: 100.0,
            buy_levels_used: 1,
            sell_levels_used: 2,
            buy_fees: (0.0002, 0.0005),
            sell_fees: (0.0008, 0.0010),
            detection_ts: Utc::now(),
            mode: DetectionMode::Stream,
        }
    }

    fn tri() -> TriOpportunity {
        TriOpportunity {
            venue: "binance".into(),
            base_asset: "USDT".into(),
            cycle: ("USDT".into(), "BTC".into(), "ETH".into()),
            start_amount: 1000.0,
            end_amount: 1029.12,
            gain_bps: 291.2,
            notional: 1000.0,
            leg1: Leg { symbol: "BTC/USDT".into(), price: 50_000.0, side: Side::Buy },
            leg2: Leg { symbol: "ETH/BTC".into(), price: 0.03125, side: Side::Buy },
            leg3: Leg { symbol: "ETH/USDT".into(), price: 1608.0, side: Side::Sell },
            fees: (0.0002, 0.0005),
            detection_ts: Utc::now(),
        }
    }

    #[test]
    fn cross_message_is_ascii_and_carries_key_figures() {
        let opp = cross();
        let msg = format_cross(&opp);
        assert!(msg.is_ascii());
        assert!(msg.contains("BTC/USDT"));
        assert!(msg.contains("19.90bps"));
        assert!(msg.contains("Depth: buy 1 / sell 2 levels"));
        assert!(msg.contains("Fees: buy maker 0.0002/taker 0.0005"));
        assert!(msg.contains("UTC"));
    }

    #[test]
    fn tri_message_carries_all_three_legs_and_start_end() {
        let opp = tri();
        let msg = format_tri(&opp);
        assert!(msg.is_ascii());
        assert!(msg.contains("USDT -> BTC -> ETH -> USDT"));
        assert!(msg.contains("Start: 1000.0000 USDT -> End: 1029.1200 USDT"));
        assert!(msg.contains("Leg1 BTC/USDT @ 50000.000000"));
        assert!(msg.contains("Leg2 ETH/BTC @ 0.031250"));
        assert!(msg.contains("Leg3 ETH/USDT @ 1608.000000"));
        assert!(msg.contains("UTC"));
    }
}
