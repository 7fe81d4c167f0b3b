//! Concrete [`crate::connector::Connector`] implementations. `generic_rest`
//! covers the REST shape most venues share; `native_ws` is the template for a
//! venue whose streaming protocol doesn't fit that shape. Which variant a
//! given venue uses is a tagged choice made once at construction
//! ([`crate::connector::ConnectorKind`]) — not resolved here, since that
//! requires the venue registry this crate doesn't own.

pub mod generic_rest;
pub mod native_ws;

pub use generic_rest::GenericRestConnector;
pub use native_ws::NativeWsConnector;
