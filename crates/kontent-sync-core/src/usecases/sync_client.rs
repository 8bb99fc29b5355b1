//! Sync protocol driver
//!
//! [`SyncClient`] exposes the three Sync API operations:
//!
//! 1. `initialize_sync` - obtain the first continuation token
//! 2. `get_delta` - fetch one page of changes for a token
//! 3. `get_all_delta` - follow tokens page by page until the change stream
//!    is drained, a page limit is reached, or a call fails
//!
//! Every HTTP call goes through the client's [`RetryPolicy`]. Expected API
//! failures come back as data inside the result types; only contract
//! violations and cancellation are returned as `Err`.

use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::{
    DeltaPage, DomainError, EnvironmentId, InitAck, SyncAllDeltaResult, SyncPayload, SyncResult,
    SyncToken,
};
use crate::ports::{ISyncTransport, SyncRequest};
use crate::retry::{Cancelled, RetryPolicy};

/// Failures of the high-level sync operations that are not API errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncClientError {
    /// A caller-supplied argument was rejected before any request was made
    #[error(transparent)]
    InvalidArgument(#[from] DomainError),

    /// The caller cancelled the operation
    #[error("Sync operation was cancelled")]
    Cancelled,
}

impl From<Cancelled> for SyncClientError {
    fn from(_: Cancelled) -> Self {
        SyncClientError::Cancelled
    }
}

// ============================================================================
// SyncInitOptions
// ============================================================================

/// Filters narrowing what a new sync session tracks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncInitOptions {
    /// Content type codenames
    pub content_types: BTreeSet<String>,
    /// Collection codenames
    pub collections: BTreeSet<String>,
    /// Language codename
    pub language: Option<String>,
    /// Only track items in exactly `language`, without fallback variants
    pub ignore_language_fallbacks: bool,
}

impl SyncInitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content_type(mut self, codename: impl Into<String>) -> Self {
        self.content_types.insert(codename.into());
        self
    }

    pub fn with_collection(mut self, codename: impl Into<String>) -> Self {
        self.collections.insert(codename.into());
        self
    }

    pub fn with_language(mut self, codename: impl Into<String>) -> Self {
        self.language = Some(codename.into());
        self
    }

    pub fn ignore_language_fallbacks(mut self, ignore: bool) -> Self {
        self.ignore_language_fallbacks = ignore;
        self
    }

    /// Query parameters of the init request
    ///
    /// Blank codenames are skipped. The exact-language `language` parameter
    /// is only sent together with `system.language`.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();

        let joined = |set: &BTreeSet<String>| {
            set.iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(",")
        };

        let types = joined(&self.content_types);
        if !types.is_empty() {
            query.push(("system.type[in]".to_string(), types));
        }

        let collections = joined(&self.collections);
        if !collections.is_empty() {
            query.push(("system.collection[in]".to_string(), collections));
        }

        if let Some(language) = self
            .language
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
        {
            query.push(("system.language".to_string(), language.to_string()));
            if self.ignore_language_fallbacks {
                query.push(("language".to_string(), language.to_string()));
            }
        }

        query
    }
}

// ============================================================================
// SyncClient
// ============================================================================

/// Driver for the Sync API of one environment
///
/// Holds no per-pull state: a single client may serve concurrent pulls for
/// different tokens.
pub struct SyncClient {
    transport: Arc<dyn ISyncTransport>,
    environment_id: EnvironmentId,
    retry_policy: RetryPolicy,
}

impl SyncClient {
    /// Creates a client for `environment_id` that sends requests through
    /// `transport`
    pub fn new(
        transport: Arc<dyn ISyncTransport>,
        environment_id: EnvironmentId,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            environment_id,
            retry_policy,
        }
    }

    pub fn environment_id(&self) -> &EnvironmentId {
        &self.environment_id
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Starts a new sync session
    ///
    /// On success the first continuation token is available through
    /// [`SyncResult::sync_token`].
    ///
    /// # Errors
    ///
    /// Only [`SyncClientError::Cancelled`]; API failures are in the result.
    pub async fn initialize_sync(
        &self,
        options: Option<&SyncInitOptions>,
        cancel: &CancellationToken,
    ) -> Result<SyncResult<InitAck>, SyncClientError> {
        let query = options.map(SyncInitOptions::to_query).unwrap_or_default();
        debug!(environment_id = %self.environment_id, filters = query.len(), "Initializing sync");

        let request = SyncRequest::init(&self.environment_id, query);
        let result = self.execute::<InitAck>(request, cancel).await?;

        if result.is_success() && result.sync_token().is_none() {
            warn!(
                environment_id = %self.environment_id,
                "Sync initialized without a continuation token"
            );
        }
        Ok(result)
    }

    /// Fetches one page of changes
    ///
    /// # Errors
    ///
    /// [`SyncClientError::InvalidArgument`] for a blank token (no request is
    /// made), [`SyncClientError::Cancelled`] on cancellation.
    pub async fn get_delta(
        &self,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<SyncResult<DeltaPage>, SyncClientError> {
        let token = SyncToken::new(token)?;
        Ok(self.fetch_delta(&token, cancel).await?)
    }

    /// Fetches pages until the change stream is drained
    ///
    /// Pages are fetched strictly one after another. A page without a new
    /// token keeps the previous one. With `max_pages`, the pull stops once
    /// that many pages were fetched even if more are available.
    ///
    /// # Errors
    ///
    /// [`SyncClientError::InvalidArgument`] for a blank token or a zero page
    /// limit (no request is made). [`SyncClientError::Cancelled`] if `cancel`
    /// fires; pages fetched so far are discarded.
    pub async fn get_all_delta(
        &self,
        token: &str,
        max_pages: Option<u32>,
        cancel: &CancellationToken,
    ) -> Result<SyncAllDeltaResult, SyncClientError> {
        let mut current = SyncToken::new(token)?;
        if max_pages == Some(0) {
            return Err(DomainError::InvalidMaxPages(
                "must be a positive integer, got 0".to_string(),
            )
            .into());
        }

        let mut responses: Vec<DeltaPage> = Vec::new();

        loop {
            if cancel.is_cancelled() {
                info!(pages = responses.len(), "Delta pull cancelled");
                return Err(SyncClientError::Cancelled);
            }

            let result = self.fetch_delta(&current, cancel).await?;
            let has_more = result.has_more_changes();
            let next_token = result.sync_token().cloned();

            let page = match result.into_result() {
                Ok(page) => page,
                Err(error) => {
                    warn!(
                        pages = responses.len(),
                        reason = %error.reason,
                        "Delta pull stopped by failed page"
                    );
                    return Ok(SyncAllDeltaResult::failed(responses, current, error));
                }
            };

            debug!(
                page = responses.len() + 1,
                changes = page.total_changes(),
                has_more,
                new_token = next_token.is_some(),
                "Delta page fetched"
            );
            responses.push(page);
            if let Some(token) = next_token {
                current = token;
            }

            if !has_more {
                info!(pages = responses.len(), "Delta pull complete");
                return Ok(SyncAllDeltaResult::completed(responses, current, false));
            }

            if let Some(limit) = max_pages {
                if responses.len() >= limit as usize {
                    info!(
                        pages = responses.len(),
                        max_pages = limit,
                        "Delta pull stopped at page limit"
                    );
                    return Ok(SyncAllDeltaResult::completed(responses, current, true));
                }
            }
        }
    }

    async fn fetch_delta(
        &self,
        token: &SyncToken,
        cancel: &CancellationToken,
    ) -> Result<SyncResult<DeltaPage>, Cancelled> {
        let request = SyncRequest::delta(&self.environment_id, token);
        self.execute(request, cancel).await
    }

    /// Sends `request` through the retry policy and wraps the final outcome
    async fn execute<T: SyncPayload>(
        &self,
        request: SyncRequest,
        cancel: &CancellationToken,
    ) -> Result<SyncResult<T>, Cancelled> {
        let transport = &self.transport;
        let request = &request;

        let outcome = self
            .retry_policy
            .execute(cancel, move || transport.send(request))
            .await?;

        Ok(match outcome {
            Ok(response) => SyncResult::from_response(&response),
            Err(e) => SyncResult::from_transport_error(transport.request_url(request), &e),
        })
    }
}

impl std::fmt::Debug for SyncClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncClient")
            .field("environment_id", &self.environment_id)
            .field("retry_policy", &self.retry_policy)
            .finish_non_exhaustive()
    }
}
