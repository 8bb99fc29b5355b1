//! Init command - Start a sync session
//!
//! Provides the `ksync init` CLI command which:
//! 1. Builds the filter set from `--type`, `--collection` and `--language`
//! 2. Calls the init endpoint through a fresh [`SyncSession`]
//! 3. Prints the continuation token to store for later delta calls

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use kontent_sync_core::usecases::{SyncInitOptions, SyncSession};
use tracing::info;

use super::{cancel_on_ctrl_c, exit_code, CommandContext};
use crate::output::{describe_error, get_formatter};

#[derive(Debug, Args)]
pub struct InitCommand {
    /// Only track items of this content type (repeatable)
    #[arg(long = "type", value_name = "CODENAME")]
    pub content_types: Vec<String>,

    /// Only track items in this collection (repeatable)
    #[arg(long = "collection", value_name = "CODENAME")]
    pub collections: Vec<String>,

    /// Only track this language variant
    #[arg(long, value_name = "CODENAME")]
    pub language: Option<String>,

    /// Do not fall back to other languages for untranslated items
    #[arg(long, requires = "language")]
    pub ignore_language_fallbacks: bool,
}

impl InitCommand {
    /// Builds init filters from the command-line flags
    pub fn to_options(&self) -> SyncInitOptions {
        let mut options = SyncInitOptions::new();
        for codename in &self.content_types {
            options = options.with_content_type(codename);
        }
        for codename in &self.collections {
            options = options.with_collection(codename);
        }
        if let Some(language) = &self.language {
            options = options.with_language(language);
        }
        options.ignore_language_fallbacks(self.ignore_language_fallbacks)
    }

    pub async fn execute(&self, ctx: &CommandContext) -> Result<ExitCode> {
        let formatter = get_formatter(ctx.format);
        let client = ctx.client()?;
        let options = self.to_options();

        info!(client = %ctx.client_name, filters = ?options.to_query(), "Initializing sync");

        let mut session = SyncSession::new(client);
        let cancel = cancel_on_ctrl_c();
        let result = session.initialize(Some(&options), &cancel).await?;

        if ctx.format.is_json() {
            let json = serde_json::json!({
                "result": result,
                "session": session.progress(),
            });
            formatter.print_json(&json);
        } else if let Some(error) = session.progress().last_error() {
            formatter.error(&describe_error(error));
            formatter.info(&format!("Request: {}", result.request_url()));
        } else {
            formatter.success("Sync initialized");
            if let Some(token) = session.progress().sync_token() {
                formatter.info(&format!("Continuation token: {token}"));
            }
            formatter.info("Run `ksync pull <TOKEN>` to fetch changes");
        }

        Ok(exit_code(session.progress().last_error().is_none()))
    }
}
