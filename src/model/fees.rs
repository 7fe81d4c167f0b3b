//! Per-venue fee quotes and their provenance.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FeeSource {
    Public,
    Default,
    Env,
}

impl std::fmt::Display for FeeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FeeSource::Public => "public",
            FeeSource::Default => "default",
            FeeSource::Env => "env",
        };
        write!(f, "{s}")
    }
}

/// A venue's fee quote. Immutable once built at startup.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Fees {
    pub venue: String,
    pub maker: f64,
    pub taker: f64,
    pub source: FeeSource,
    pub symbol_specific: HashMap<String, (f64, f64)>,
}

impl Fees {
    pub fn new(venue: impl Into<String>, maker: f64, taker: f64, source: FeeSource) -> Self {
        Self {
            venue: venue.into(),
            maker,
            taker,
            source,
            symbol_specific: HashMap::new(),
        }
    }

    /// (maker, taker) for a symbol, preferring a symbol-specific override.
    pub fn get(&self, symbol: Option<&str>) -> (f64, f64) {
        if let Some(symbol) = symbol {
            if let Some(pair) = self.symbol_specific.get(symbol) {
                return *pair;
            }
        }
        (self.maker, self.taker)
    }

    pub fn taker_for(&self, symbol: Option<&str>) -> f64 {
        self.get(symbol).1
    }
}
