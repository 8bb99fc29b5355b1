//! Long-lived sync session
//!
//! Wraps a [`SyncClient`] for a consumer that keeps pulling the same change
//! stream over time. The session remembers the latest token and enforces
//! the lifecycle in [`SessionState`].

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::sync_client::{SyncClient, SyncClientError, SyncInitOptions};
use crate::domain::{
    InitAck, SessionProgress, SessionState, SyncAllDeltaResult, SyncError, SyncErrorReason,
    SyncResult, SyncToken,
};

/// A sync session bound to one client
#[derive(Debug)]
pub struct SyncSession {
    client: Arc<SyncClient>,
    progress: SessionProgress,
}

impl SyncSession {
    /// Creates an uninitialized session
    pub fn new(client: Arc<SyncClient>) -> Self {
        Self {
            client,
            progress: SessionProgress::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.progress.state()
    }

    pub fn progress(&self) -> &SessionProgress {
        &self.progress
    }

    pub fn client(&self) -> &Arc<SyncClient> {
        &self.client
    }

    /// Initializes the session against the API
    ///
    /// A successful response without a continuation token moves the session
    /// to `Errored`, since there is nothing to pull from.
    ///
    /// # Errors
    ///
    /// `InvalidState` if the session was already initialized (no request is
    /// made), or `Cancelled`.
    pub async fn initialize(
        &mut self,
        options: Option<&SyncInitOptions>,
        cancel: &CancellationToken,
    ) -> Result<SyncResult<InitAck>, SyncClientError> {
        self.progress.check_transition(SessionState::Initialized)?;

        let result = self.client.initialize_sync(options, cancel).await?;

        match (result.error(), result.sync_token()) {
            (None, Some(token)) => {
                self.progress.mark_initialized(token.clone())?;
                info!(environment_id = %self.client.environment_id(), "Sync session initialized");
            }
            (Some(error), _) => {
                self.progress.mark_errored(error.clone(), 0, None)?;
            }
            (None, None) => {
                let error = SyncError::new(
                    "The initialization response carried no continuation token.",
                    SyncErrorReason::InvalidResponse,
                )
                .with_error_code(i64::from(result.status_code()));
                self.progress.mark_errored(error, 0, None)?;
            }
        }
        Ok(result)
    }

    /// Continues a session from a previously stored token
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a blank token or a session that is not
    /// uninitialized.
    pub fn resume(&mut self, token: &str) -> Result<(), SyncClientError> {
        let token = SyncToken::new(token)?;
        self.progress.mark_initialized(token)?;
        debug!("Sync session resumed from stored token");
        Ok(())
    }

    /// Pulls pages from the current token
    ///
    /// On success the session advances to the aggregate's final token and
    /// becomes `Paging` (page limit hit) or `Exhausted`. A failed pull moves
    /// the session to `Errored`, keeping the token that failed so the caller
    /// can retry from it with a new session. Cancellation leaves the session
    /// untouched.
    ///
    /// # Errors
    ///
    /// `InvalidState` when the session cannot pull, `InvalidArgument` for a
    /// zero page limit, or `Cancelled`.
    pub async fn pull(
        &mut self,
        max_pages: Option<u32>,
        cancel: &CancellationToken,
    ) -> Result<SyncAllDeltaResult, SyncClientError> {
        let token = self.progress.pull_token()?.clone();

        let result = self
            .client
            .get_all_delta(token.as_str(), max_pages, cancel)
            .await?;

        match result.error() {
            None => self.progress.record_pull(
                result.final_sync_token().clone(),
                result.pages_fetched(),
                result.was_limited_by_max_pages(),
            )?,
            Some(error) => self.progress.mark_errored(
                error.clone(),
                result.pages_fetched(),
                Some(result.final_sync_token().clone()),
            )?,
        }

        debug!(
            state = %self.progress.state(),
            total_pages = self.progress.pages_fetched(),
            "Sync session pull finished"
        );
        Ok(result)
    }
}
