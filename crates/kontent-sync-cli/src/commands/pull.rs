//! Pull command - Fetch pages until caught up
//!
//! Provides the `ksync pull` CLI command which:
//! 1. Resumes a session from the given token
//! 2. Follows continuation tokens until no more changes are reported,
//!    `--max-pages` is reached, or Ctrl-C is pressed
//! 3. Prints the token to resume from next time, also after a failure

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use kontent_sync_core::domain::{SessionProgress, SyncAllDeltaResult};
use kontent_sync_core::usecases::{SyncClientError, SyncSession};
use tracing::info;

use super::{cancel_on_ctrl_c, exit_code, CommandContext};
use crate::output::{describe_counts, describe_error, get_formatter, OutputFormatter};

#[derive(Debug, Args)]
pub struct PullCommand {
    /// Token to start pulling from
    pub token: String,

    /// Stop after this many pages
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_pages: Option<u32>,
}

impl PullCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<ExitCode> {
        let formatter = get_formatter(ctx.format);
        let client = ctx.client()?;

        let mut session = SyncSession::new(client);
        session.resume(&self.token)?;

        info!(
            client = %ctx.client_name,
            max_pages = ?self.max_pages,
            "Pulling changes"
        );

        let cancel = cancel_on_ctrl_c();
        let result = match session.pull(self.max_pages, &cancel).await {
            Ok(result) => result,
            Err(SyncClientError::Cancelled) => {
                formatter.warn("Pull cancelled; no token was advanced");
                return Ok(ExitCode::from(130));
            }
            Err(e) => return Err(e.into()),
        };

        if ctx.format.is_json() {
            let json = serde_json::json!({
                "result": result,
                "total_changes": result.total_changes(),
                "session": session.progress(),
            });
            formatter.print_json(&json);
        } else {
            print_summary(formatter.as_ref(), &result, session.progress());
        }

        Ok(exit_code(result.is_success()))
    }
}

fn print_summary(
    formatter: &dyn OutputFormatter,
    result: &SyncAllDeltaResult,
    progress: &SessionProgress,
) {
    match result.error() {
        None => formatter.success(&format!(
            "Pulled {} changes in {} pages",
            result.total_changes(),
            result.pages_fetched()
        )),
        Some(error) => formatter.error(&describe_error(error)),
    }

    for (index, page) in result.responses().iter().enumerate() {
        formatter.info(&format!("Page {}: {}", index + 1, describe_counts(page)));
    }

    if result.was_limited_by_max_pages() {
        formatter.info("Stopped at the page limit; more changes are available");
    }
    formatter.info(&format!("State: {}", progress.state()));
    formatter.info(&format!("Resume token: {}", result.final_sync_token()));
}
