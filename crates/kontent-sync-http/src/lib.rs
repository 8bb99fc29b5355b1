//! Kontent Sync HTTP - Sync API adapter
//!
//! Provides the network side of the sync client:
//! - [`transport::ReqwestTransport`] - `reqwest`-based implementation of the
//!   `ISyncTransport` port, including API key authentication
//! - [`registry::SyncClientRegistry`] - named clients built from configuration
//!
//! ## Usage
//!
//! ```rust,no_run
//! use kontent_sync_core::config::SyncOptionsBuilder;
//! use kontent_sync_http::registry::build_client;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let options = SyncOptionsBuilder::new()
//!     .environment_id("975bf280-fd91-488c-994c-2f04416e5ee3")
//!     .build();
//! let client = build_client(&options)?;
//!
//! let cancel = CancellationToken::new();
//! let init = client.initialize_sync(None, &cancel).await?;
//! if let Some(token) = init.sync_token() {
//!     let all = client.get_all_delta(token.as_str(), None, &cancel).await?;
//!     println!("{} changes", all.total_changes());
//! }
//! # Ok(())
//! # }
//! ```

pub mod registry;
pub mod transport;

pub use registry::{build_client, RegistryError, SyncClientRegistry, DEFAULT_CLIENT_NAME};
pub use transport::ReqwestTransport;
