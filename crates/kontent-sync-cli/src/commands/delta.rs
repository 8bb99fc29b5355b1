//! Delta command - Fetch one page of changes

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use tracing::info;

use super::{cancel_on_ctrl_c, exit_code, CommandContext};
use crate::output::{describe_counts, describe_error, get_formatter};

#[derive(Debug, Args)]
pub struct DeltaCommand {
    /// Continuation token from `init` or a previous delta call
    pub token: String,
}

impl DeltaCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<ExitCode> {
        let formatter = get_formatter(ctx.format);
        let client = ctx.client()?;

        info!(client = %ctx.client_name, "Fetching delta page");

        let cancel = cancel_on_ctrl_c();
        let result = client.get_delta(&self.token, &cancel).await?;

        if ctx.format.is_json() {
            formatter.print_json(&serde_json::to_value(&result)?);
        } else if let Some(error) = result.error() {
            formatter.error(&describe_error(error));
            formatter.info(&format!("Request: {}", result.request_url()));
        } else {
            let page = result.value();
            formatter.success(&format!("Fetched {} changes", page.total_changes()));
            formatter.info(&describe_counts(page));
            if let Some(token) = result.sync_token() {
                formatter.info(&format!("Next token: {token}"));
            }
            if result.has_more_changes() {
                formatter.info("More changes are available");
            }
        }

        Ok(exit_code(result.is_success()))
    }
}
