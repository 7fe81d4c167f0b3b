//! Dedup + rate-limited alert delivery, decoupled from the scanners and from
//! whatever transport ends up sending the message.

pub mod dedup;
pub mod message;
pub mod pipeline;

pub use dedup::DedupTable;
pub use pipeline::{AlertPipeline, LoggingSink, NotificationSink, SendError};
