//! Use cases (interactors) for kontent-sync
//!
//! This module contains the application use cases that orchestrate
//! domain types and the transport port.
//!
//! ## Use Cases
//!
//! - [`SyncClient`] - initialize, single delta fetch, multi-page pull
//! - [`SyncSession`] - long-lived consumer that tracks its token and state

pub mod session;
pub mod sync_client;

pub use session::SyncSession;
pub use sync_client::{SyncClient, SyncClientError, SyncInitOptions};
