//! Domain types for the sync protocol
//!
//! This module contains the core domain types:
//! - Newtypes for validated identifiers (`SyncToken`, `EnvironmentId`)
//! - Change records and delta pages returned by the Sync API
//! - The result envelope and multi-page aggregate result
//! - Normalized errors and their classification
//! - Sync session progress and its state machine
//! - Domain-specific error types

pub mod change;
pub mod delta;
pub mod errors;
pub mod newtypes;
pub mod result;
pub mod session;
pub mod sync_error;

// Re-export commonly used types
pub use change::{
    Asset, ChangeRecord, ChangeType, ContentType, EntityCategory, Item, Language, Taxonomy,
};
pub use delta::{DeltaPage, InitAck, SyncPayload, MAX_ITEMS_PER_ENTITY_TYPE};
pub use errors::DomainError;
pub use newtypes::{EnvironmentId, SyncToken};
pub use result::{SyncAllDeltaResult, SyncResult};
pub use session::{SessionProgress, SessionState};
pub use sync_error::{ErrorBody, SyncError, SyncErrorReason, GENERIC_ERROR_MESSAGE};
