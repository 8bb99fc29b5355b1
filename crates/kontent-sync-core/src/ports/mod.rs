//! Port definitions (hexagonal architecture interfaces)
//!
//! Ports are the interfaces the sync core depends on but whose
//! implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`ISyncTransport`] - performs a single HTTP request against the Sync API

pub mod transport;

pub use transport::{
    ISyncTransport, RawResponse, SyncMethod, SyncRequest, TransportError, CONTINUATION_HEADER,
};
