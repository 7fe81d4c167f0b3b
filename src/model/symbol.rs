//! Assets and trading symbols shared by every component downstream of ingestion.

use std::fmt;

/// An uppercase ticker, e.g. `BTC`, `USDT`.
pub type Asset = String;

/// An ordered (base, quote) pair, canonically rendered `BASE/QUOTE`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct Symbol {
    pub base: Asset,
    pub quote: Asset,
}

impl Symbol {
    /// Builds a symbol, rejecting the cases the ingest pipeline must never construct.
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Option<Self> {
        let base = base.into();
        let quote = quote.into();
        if base.is_empty() || quote.is_empty() || base == quote {
            return None;
        }
        Some(Self { base, quote })
    }

    pub fn reversed(&self) -> Symbol {
        Symbol {
            base: self.quote.clone(),
            quote: self.base.clone(),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}
