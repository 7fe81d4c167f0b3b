//! Fee model: resolves (maker, taker) for a venue at startup from a public
//! quote, a built-in table, or a conservative default, then lets environment
//! variables override whichever was picked.

use std::collections::HashMap;

use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, info};

use crate::model::{FeeSource, Fees};

/// Conservative fallback when a venue has no public quote and isn't in the
/// built-in table.
const DEFAULT_MAKER: f64 = 0.0008;
const DEFAULT_TAKER: f64 = 0.0015;

/// Commonly-known (maker, taker) pairs, used when a venue's public fee
/// endpoint is unavailable or not implemented by the caller.
fn builtin_table() -> HashMap<&'static str, (f64, f64)> {
    [
        ("binance", (0.0002, 0.0005)),
        ("okx", (0.0008, 0.0010)),
        ("bybit", (0.0001, 0.0006)),
        ("coinbase", (0.0040, 0.0060)),
        ("kraken", (0.0016, 0.0026)),
        ("kucoin", (0.0008, 0.0010)),
        ("gateio", (0.0015, 0.0020)),
        ("huobi", (0.0015, 0.0020)),
        ("bitfinex", (0.0010, 0.0020)),
        ("mexc", (0.0000, 0.0020)),
    ]
    .into_iter()
    .collect()
}

#[derive(Debug, Error)]
pub enum FeeError {
    #[error("fee override value out of range [0,1): {0}")]
    OutOfRange(f64),
}

/// A source of public fee quotes. Exchange discovery owns the real
/// implementation; this crate only depends on the trait (per the contract
/// split in the scope notes).
#[async_trait::async_trait]
pub trait PublicFeeSource: Send + Sync {
    async fn fetch(&self, venue: &str) -> Option<(f64, f64)>;
}

/// A source that never has a public quote; every venue falls through to the
/// built-in table or the conservative default. Useful as the default when no
/// discovery collaborator is wired up.
pub struct NoPublicFees;

#[async_trait::async_trait]
impl PublicFeeSource for NoPublicFees {
    async fn fetch(&self, _venue: &str) -> Option<(f64, f64)> {
        None
    }
}

/// Resolves and caches fees per venue. Written once per venue at startup,
/// read-only thereafter.
pub struct FeeModel {
    cache: RwLock<HashMap<String, Fees>>,
    builtin: HashMap<&'static str, (f64, f64)>,
}

impl Default for FeeModel {
    fn default() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            builtin: builtin_table(),
        }
    }
}

impl FeeModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves fees for `venue`: public source, then built-in table, then
    /// conservative default; then applies any env override for this venue.
    pub async fn resolve(&self, venue: &str, source: &dyn PublicFeeSource) -> Fees {
        let (maker, taker, provenance) = if let Some((maker, taker)) = source.fetch(venue).await {
            (maker, taker, FeeSource::Public)
        } else if let Some((maker, taker)) = self.builtin.get(venue.to_lowercase().as_str()) {
            (*maker, *taker, FeeSource::Default)
        } else {
            debug!(venue, "no public or built-in fee quote, using conservative default");
            (DEFAULT_MAKER, DEFAULT_TAKER, FeeSource::Default)
        };

        let mut fees = Fees::new(venue, maker, taker, provenance);
        if let Some((maker, taker)) = Self::env_override(venue) {
            fees.maker = maker;
            fees.taker = taker;
            fees.source = FeeSource::Env;
            info!(venue, maker, taker, "fee override applied from environment");
        }

        self.cache.write().insert(venue.to_lowercase(), fees.clone());
        fees
    }

    /// Reads `<VENUE>_MAKER_FEE` / `<VENUE>_TAKER_FEE` from the process
    /// environment, matching the `<VENUE>_TYPE_FEE` naming convention.
    fn env_override(venue: &str) -> Option<(f64, f64)> {
        let prefix = venue.to_uppercase();
        let maker_key = format!("{prefix}_MAKER_FEE");
        let taker_key = format!("{prefix}_TAKER_FEE");

        let env_maker = std::env::var(&maker_key).ok().and_then(|v| v.parse().ok());
        let env_taker = std::env::var(&taker_key).ok().and_then(|v| v.parse().ok());

        if env_maker.is_none() && env_taker.is_none() {
            return None;
        }

        // Need a baseline to fill in the side that wasn't overridden; reuse
        // the built-in/default values rather than guessing 0.
        let (base_maker, base_taker) = builtin_table()
            .get(venue.to_lowercase().as_str())
            .copied()
            .unwrap_or((DEFAULT_MAKER, DEFAULT_TAKER));

        Some((
            env_maker.unwrap_or(base_maker),
            env_taker.unwrap_or(base_taker),
        ))
    }

    /// Scans the whole environment for `<VENUE>_TAKER_FEE` / `<VENUE>_MAKER_FEE`
    /// keys, returning every venue with at least one override. Used at startup
    /// to log what's being overridden before any venue connects.
    pub fn scan_env_overrides() -> HashMap<String, (Option<f64>, Option<f64>)> {
        let mut overrides: HashMap<String, (Option<f64>, Option<f64>)> = HashMap::new();
        for (key, value) in std::env::vars() {
            let parts: Vec<&str> = key.split('_').collect();
            if parts.len() < 3 {
                continue;
            }
            let fee_type = parts[parts.len() - 2];
            let suffix = parts[parts.len() - 1];
            if suffix != "FEE" {
                continue;
            }
            let venue = parts[..parts.len() - 2].join("_").to_lowercase();
            if venue.is_empty() {
                continue;
            }
            let Ok(parsed) = value.parse::<f64>() else {
                continue;
            };
            let entry = overrides.entry(venue).or_insert((None, None));
            match fee_type {
                "MAKER" => entry.0 = Some(parsed),
                "TAKER" => entry.1 = Some(parsed),
                _ => {}
            }
        }
        overrides
    }

    pub fn cached(&self, venue: &str) -> Option<Fees> {
        self.cache.read().get(&venue.to_lowercase()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builtin_table_used_when_no_public_quote() {
        let model = FeeModel::new();
        let fees = model.resolve("binance", &NoPublicFees).await;
        assert_eq!(fees.source, FeeSource::Default);
        assert_eq!((fees.maker, fees.taker), (0.0002, 0.0005));
    }

    #[tokio::test]
    async fn unknown_venue_falls_back_to_conservative_default() {
        let model = FeeModel::new();
        let fees = model.resolve("some_new_dex", &NoPublicFees).await;
        assert_eq!((fees.maker, fees.taker), (DEFAULT_MAKER, DEFAULT_TAKER));
    }

    #[test]
    fn env_scan_parses_venue_and_fee_type() {
        std::env::set_var("BINANCE_TAKER_FEE", "0.0005");
        let overrides = FeeModel::scan_env_overrides();
        assert_eq!(overrides.get("binance").unwrap().1, Some(0.0005));
        std::env::remove_var("BINANCE_TAKER_FEE");
    }
}
