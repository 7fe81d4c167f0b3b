//! Cross-exchange and triangular crypto arbitrage detection: multi-venue
//! order book ingestion, a shared book store, VWAP-based spread detection,
//! and a dedup/rate-limited alert pipeline. No order execution happens here.

pub mod alert;
pub mod book_store;
pub mod coalescer;
pub mod config;
pub mod connector;
pub mod connectors;
pub mod depth;
pub mod fees;
pub mod health;
pub mod ingest;
pub mod model;
pub mod persistence;
pub mod scanners;
pub mod symbolmap;

pub use book_store::BookStore;
pub use config::Config;
pub use fees::FeeModel;
