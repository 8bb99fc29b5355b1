//! Kontent Sync Core - Sync protocol driver and domain model
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain types** - `SyncToken`, `DeltaPage`, `ChangeRecord`, `SyncResult`,
//!   `SyncAllDeltaResult`, `SyncError`, `SessionProgress`
//! - **Error classification** - mapping failed responses to a closed set of reasons
//! - **Retry policy** - exponential backoff with jitter around single HTTP attempts
//! - **Port definitions** - the `ISyncTransport` trait implemented by adapters
//! - **Use cases** - `SyncClient`, the initialize / delta / paginate driver, and
//!   the `SyncSession` facade
//!
//! # Architecture
//!
//! The domain module is pure: it never performs I/O. Ports define the trait
//! interfaces that adapter crates implement (see `kontent-sync-http`), and the
//! use cases orchestrate domain types through those ports.

pub mod config;
pub mod domain;
pub mod ports;
pub mod retry;
pub mod usecases;
