//! Ingestion: one logical task per (venue, symbol), in either stream or poll
//! mode, feeding the per-stream [`crate::coalescer::CoalesceQueue`].

pub mod poll;
pub mod stream;

pub use poll::run_poll_ingestor;
pub use stream::run_stream_ingestor;

/// Default hot-set symbols polled at 1s cadence instead of 3s (§4.2).
pub fn default_hot_symbols() -> Vec<String> {
    vec!["BTC/USDT".into(), "ETH/USDT".into(), "BNB/USDT".into()]
}
