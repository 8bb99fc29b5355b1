//! CLI command implementations

pub mod config;
pub mod delta;
pub mod init;
pub mod pull;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use kontent_sync_core::config::Config;
use kontent_sync_core::usecases::SyncClient;
use kontent_sync_http::SyncClientRegistry;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::output::OutputFormat;

/// Settings shared by every command
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub format: OutputFormat,
    pub config_path: PathBuf,
    pub client_name: String,
}

impl CommandContext {
    /// Loads the configuration file, failing if it is missing or malformed
    pub fn load_config(&self) -> Result<Config> {
        Config::load(&self.config_path).with_context(|| {
            format!(
                "Failed to load configuration from {}",
                self.config_path.display()
            )
        })
    }

    /// Builds the client selected with `--client`
    pub fn client(&self) -> Result<Arc<SyncClient>> {
        let config = self.load_config()?;
        let registry = SyncClientRegistry::from_config(&config)
            .context("Failed to build sync clients from configuration")?;
        debug!(client = %self.client_name, "Selecting sync client");
        registry
            .get(&self.client_name)
            .with_context(|| format!("Available clients: {}", available(&registry)))
    }
}

fn available(registry: &SyncClientRegistry) -> String {
    if registry.is_empty() {
        "none".to_string()
    } else {
        registry.names().collect::<Vec<_>>().join(", ")
    }
}

/// Returns a token that is cancelled on Ctrl-C
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling");
            trigger.cancel();
        }
    });
    cancel
}

/// Maps an API outcome to the process exit code
pub fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
