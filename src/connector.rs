//! The single connector contract every venue implements, whether backed by a
//! generic third-party market-data library or a venue's native protocol.
//! Dispatch between variants is a tagged choice made once at construction.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{Fees, OrderBook, Symbol};

#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("timeout waiting for {0}")]
    Timeout(String),
}

/// A venue connection. Implementors own their own reconnect/backoff state
/// internally; ingestion tasks only call through this trait.
#[async_trait]
pub trait Connector: Send + Sync {
    fn venue(&self) -> &str;

    async fn connect(&self) -> Result<(), ConnectorError>;

    async fn disconnect(&self);

    /// Fetches one depth-N snapshot over request/response. Used by poll mode
    /// and as the stream-mode fallback after backoff exhaustion.
    async fn poll_book(&self, symbol: &Symbol, depth: usize) -> Result<OrderBook, ConnectorError>;

    fn supports_streaming(&self) -> bool;

    /// The venue's published fee table, if this connector can fetch one.
    async fn public_fees(&self) -> Option<Fees>;
}

/// Declares which transport variant backs a connector; used purely for
/// logging/telemetry, not for dispatch (dispatch is static, through the
/// trait object itself).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorKind {
    /// A generic, library-backed implementation (e.g. a shared REST/WS client
    /// reused across several similarly-shaped venues).
    Generic,
    /// A venue's bespoke native protocol.
    Native,
}
