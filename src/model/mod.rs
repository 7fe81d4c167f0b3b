//! Canonical domain entities shared by ingestion, the scanners, the fee model
//! and the alert pipeline. Every venue-specific payload is converted into
//! these types at the earliest point; nothing downstream touches raw JSON.

pub mod fees;
pub mod health;
pub mod opportunity;
pub mod orderbook;
pub mod symbol;

pub use fees::{FeeSource, Fees};
pub use health::{VenueHealth, VenueHealthState};
pub use opportunity::{CrossOpportunity, DetectionMode, Leg, Side, TriOpportunity};
pub use orderbook::{DepthLevel, OrderBook, OrderBookError};
pub use symbol::{Asset, Symbol};
