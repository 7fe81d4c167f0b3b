//! Venue symbol normalization: raw venue tickers (`BTCUSDT`, `XBTUSD`,
//! `tBTCUSD`) are converted to the canonical `BASE/QUOTE` form at the
//! earliest point, before an [`crate::model::OrderBook`] is built.
//!
//! Explicit per-venue mappings are checked first; a suffix-matching
//! auto-normalizer handles the common concatenated-symbol case.

use std::collections::HashMap;

use crate::model::Symbol;

const KNOWN_QUOTES: &[&str] = &[
    "USDT", "USDC", "BUSD", "USD", "EUR", "BTC", "ETH", "BNB",
];

/// Kraken uses ISO-4217-ish prefixes and legacy tickers (`XBT` for BTC).
fn kraken_alias(raw: &str) -> &str {
    match raw {
        "XBT" => "BTC",
        "XDG" => "DOGE",
        other if other.len() > 3 && (other.starts_with('X') || other.starts_with('Z')) => {
            &other[1..]
        }
        other => other,
    }
}

/// Bitfinex prefixes tickers with `t` (trading pair) or `f` (funding).
fn strip_bitfinex_prefix(raw: &str) -> &str {
    if (raw.starts_with('t') || raw.starts_with('f')) && raw.len() > 1 {
        &raw[1..]
    } else {
        raw
    }
}

pub struct SymbolMapper {
    /// venue -> raw symbol -> canonical Symbol, for tickers the suffix
    /// auto-normalizer cannot resolve unambiguously.
    explicit: HashMap<(String, String), Symbol>,
}

impl Default for SymbolMapper {
    fn default() -> Self {
        let mut explicit = HashMap::new();
        explicit.insert(
            ("kraken".to_string(), "XBTUSD".to_string()),
            Symbol::new("BTC", "USD").unwrap(),
        );
        explicit.insert(
            ("kraken".to_string(), "XXBTZUSD".to_string()),
            Symbol::new("BTC", "USD").unwrap(),
        );
        Self { explicit }
    }
}

impl SymbolMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizes a raw venue symbol to its canonical `Symbol`, or `None` if
    /// it cannot be resolved against any known quote asset (the caller must
    /// then reject the snapshot, per the malformed-data policy).
    pub fn normalize(&self, venue: &str, raw: &str) -> Option<Symbol> {
        let key = (venue.to_lowercase(), raw.to_string());
        if let Some(sym) = self.explicit.get(&key) {
            return Some(sym.clone());
        }

        if let Some((base, quote)) = raw.split_once('/') {
            return Symbol::new(base, quote);
        }

        let candidate = if venue.eq_ignore_ascii_case("kraken") {
            kraken_alias(raw)
        } else if venue.eq_ignore_ascii_case("bitfinex") {
            strip_bitfinex_prefix(raw)
        } else {
            raw
        };

        self.auto_normalize(candidate)
    }

    fn auto_normalize(&self, raw: &str) -> Option<Symbol> {
        let upper = raw.to_uppercase();
        for quote in KNOWN_QUOTES {
            if upper.len() > quote.len() && upper.ends_with(quote) {
                let base = &upper[..upper.len() - quote.len()];
                if !base.is_empty() {
                    return Symbol::new(base, *quote);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binance_concatenated_symbol() {
        let mapper = SymbolMapper::new();
        let sym = mapper.normalize("binance", "BTCUSDT").unwrap();
        assert_eq!(sym.to_string(), "BTC/USDT");
    }

    #[test]
    fn kraken_legacy_ticker() {
        let mapper = SymbolMapper::new();
        let sym = mapper.normalize("kraken", "XBTUSD").unwrap();
        assert_eq!(sym.to_string(), "BTC/USD");
    }

    #[test]
    fn already_canonical_passes_through() {
        let mapper = SymbolMapper::new();
        let sym = mapper.normalize("okx", "ETH/USDT").unwrap();
        assert_eq!(sym.to_string(), "ETH/USDT");
    }

    #[test]
    fn unresolvable_symbol_is_none() {
        let mapper = SymbolMapper::new();
        assert!(mapper.normalize("unknownvenue", "FOOBAR123").is_none());
    }
}
