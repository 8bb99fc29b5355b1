//! Result envelope and multi-page aggregate
//!
//! [`SyncResult`] wraps the outcome of one API call; [`SyncAllDeltaResult`]
//! collects the pages of one multi-page pull. Both are immutable once built
//! and carry failures as data rather than as `Err`.

use serde::Serialize;
use tracing::{debug, warn};

use super::delta::{DeltaPage, SyncPayload};
use super::newtypes::SyncToken;
use super::sync_error::{SyncError, SyncErrorReason};
use crate::ports::transport::{RawResponse, TransportError, CONTINUATION_HEADER};

// ============================================================================
// SyncResult
// ============================================================================

/// Outcome of a single Sync API call
///
/// Exactly one of value and error is meaningful, as told by
/// [`SyncResult::is_success`]. A failed result holds `T::default()` as its
/// value, never carries a token and never reports more changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncResult<T> {
    is_success: bool,
    value: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<SyncError>,
    status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    sync_token: Option<SyncToken>,
    request_url: String,
    has_more_changes: bool,
}

impl<T: SyncPayload> SyncResult<T> {
    /// Creates a successful result
    ///
    /// The more-changes flag is derived from the payload.
    pub fn success(
        value: T,
        request_url: impl Into<String>,
        status_code: u16,
        sync_token: Option<SyncToken>,
    ) -> Self {
        let has_more_changes = value.has_more_changes();
        Self {
            is_success: true,
            value,
            error: None,
            status_code,
            sync_token,
            request_url: request_url.into(),
            has_more_changes,
        }
    }

    /// Creates a failed result
    pub fn failure(request_url: impl Into<String>, status_code: u16, error: SyncError) -> Self {
        Self {
            is_success: false,
            value: T::default(),
            error: Some(error),
            status_code,
            sync_token: None,
            request_url: request_url.into(),
            has_more_changes: false,
        }
    }

    /// Builds the envelope for a received HTTP response
    ///
    /// Success requires a 2xx status *and* a body that decodes; a 2xx with
    /// an undecodable body is an `InvalidResponse` failure.
    pub fn from_response(response: &RawResponse) -> Self {
        if !response.is_success() {
            let error = SyncError::classify(
                response.status,
                response.reason_phrase.as_deref(),
                Some(&response.body),
                None,
            );
            warn!(
                status = response.status,
                reason = %error.reason,
                url = %response.url,
                "Sync API call failed"
            );
            return Self::failure(response.url.clone(), response.status, error);
        }

        match T::decode(&response.body) {
            Ok(value) => {
                let token = extract_sync_token(response);
                debug!(
                    status = response.status,
                    has_token = token.is_some(),
                    url = %response.url,
                    "Sync API call succeeded"
                );
                Self::success(value, response.url.clone(), response.status, token)
            }
            Err(e) => {
                warn!(
                    status = response.status,
                    url = %response.url,
                    error = %e,
                    "Successful status with undecodable body"
                );
                let error = SyncError::new(
                    "The response body was empty or could not be decoded.",
                    SyncErrorReason::InvalidResponse,
                )
                .with_error_code(i64::from(response.status))
                .with_cause(e.to_string());
                Self::failure(response.url.clone(), response.status, error)
            }
        }
    }

    /// Builds the envelope for an attempt that produced no HTTP response
    pub fn from_transport_error(request_url: impl Into<String>, error: &TransportError) -> Self {
        let request_url = request_url.into();
        let sync_error = SyncError::classify(0, None, None, Some(error));
        warn!(
            url = %request_url,
            reason = %sync_error.reason,
            error = %error,
            "Sync API call failed without a response"
        );
        Self::failure(request_url, 0, sync_error)
    }
}

impl<T> SyncResult<T> {
    /// Whether the call succeeded
    pub fn is_success(&self) -> bool {
        self.is_success
    }

    /// The decoded value (`T::default()` on failure)
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Consumes the result, returning the value
    pub fn into_value(self) -> T {
        self.value
    }

    /// The error (`None` on success)
    pub fn error(&self) -> Option<&SyncError> {
        self.error.as_ref()
    }

    /// HTTP status code (`0` when no response was received)
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Continuation token returned with the response, if any
    pub fn sync_token(&self) -> Option<&SyncToken> {
        self.sync_token.as_ref()
    }

    /// URL the request was sent to
    pub fn request_url(&self) -> &str {
        &self.request_url
    }

    /// Whether another page is likely waiting
    pub fn has_more_changes(&self) -> bool {
        self.has_more_changes
    }

    /// Converts into a standard `Result`, dropping the envelope metadata
    pub fn into_result(self) -> Result<T, SyncError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.value),
        }
    }
}

/// Reads the continuation token header
///
/// A missing or blank header yields `None`; it is not an error.
fn extract_sync_token(response: &RawResponse) -> Option<SyncToken> {
    response
        .header(CONTINUATION_HEADER)
        .and_then(|value| SyncToken::new(value).ok())
}

// ============================================================================
// SyncAllDeltaResult
// ============================================================================

/// Outcome of a multi-page delta pull
///
/// Pages appear in fetch order. On failure the pages fetched before the
/// error are kept, and the final token is the one that failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncAllDeltaResult {
    responses: Vec<DeltaPage>,
    final_sync_token: SyncToken,
    pages_fetched: u32,
    was_limited_by_max_pages: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<SyncError>,
}

impl SyncAllDeltaResult {
    /// Creates a successful aggregate
    pub fn completed(
        responses: Vec<DeltaPage>,
        final_sync_token: SyncToken,
        was_limited_by_max_pages: bool,
    ) -> Self {
        let pages_fetched = page_count(&responses);
        Self {
            responses,
            final_sync_token,
            pages_fetched,
            was_limited_by_max_pages,
            error: None,
        }
    }

    /// Creates a failed aggregate holding the pages fetched so far
    pub fn failed(responses: Vec<DeltaPage>, final_sync_token: SyncToken, error: SyncError) -> Self {
        let pages_fetched = page_count(&responses);
        Self {
            responses,
            final_sync_token,
            pages_fetched,
            was_limited_by_max_pages: false,
            error: Some(error),
        }
    }

    /// Whether the pull ended without an error
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Pages in fetch order
    pub fn responses(&self) -> &[DeltaPage] {
        &self.responses
    }

    /// Consumes the result, returning the pages
    pub fn into_responses(self) -> Vec<DeltaPage> {
        self.responses
    }

    /// Token to resume from
    pub fn final_sync_token(&self) -> &SyncToken {
        &self.final_sync_token
    }

    /// Number of pages successfully fetched
    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    /// Whether the pull stopped at the page limit while more data was available
    pub fn was_limited_by_max_pages(&self) -> bool {
        self.was_limited_by_max_pages
    }

    /// The error that stopped the pull, if any
    pub fn error(&self) -> Option<&SyncError> {
        self.error.as_ref()
    }

    /// Total change records across all pages
    pub fn total_changes(&self) -> usize {
        self.responses.iter().map(DeltaPage::total_changes).sum()
    }
}

fn page_count(responses: &[DeltaPage]) -> u32 {
    u32::try_from(responses.len()).unwrap_or(u32::MAX)
}
