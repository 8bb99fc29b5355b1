//! Transport port (driven/secondary port)
//!
//! A transport performs exactly one HTTP request/response exchange. It does
//! not retry, classify errors or decode bodies; the sync core layers those
//! concerns on top (see [`crate::retry`] and [`crate::domain::SyncResult`]).
//!
//! Requests are expressed relative to the API endpoint; the adapter owns the
//! base URL and authentication.

use std::fmt;

use thiserror::Error;

use crate::domain::{EnvironmentId, SyncToken};

/// Header carrying the continuation token in both directions
pub const CONTINUATION_HEADER: &str = "X-Continuation";

/// HTTP method of a sync request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMethod {
    Get,
    Post,
}

impl fmt::Display for SyncMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncMethod::Get => write!(f, "GET"),
            SyncMethod::Post => write!(f, "POST"),
        }
    }
}

/// A request against the Sync API, relative to the configured endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    /// HTTP method
    pub method: SyncMethod,
    /// Path relative to the endpoint, starting with `/`
    pub path: String,
    /// Query parameters in send order
    pub query: Vec<(String, String)>,
    /// Extra request headers
    pub headers: Vec<(String, String)>,
}

impl SyncRequest {
    /// `GET /{environment_id}/sync` with the token in the continuation header
    ///
    /// The token never appears in the path or query string.
    pub fn delta(environment_id: &EnvironmentId, token: &SyncToken) -> Self {
        Self {
            method: SyncMethod::Get,
            path: format!("/{environment_id}/sync"),
            query: Vec::new(),
            headers: vec![(CONTINUATION_HEADER.to_string(), token.as_str().to_string())],
        }
    }

    /// `POST /{environment_id}/sync/init` with filter query parameters
    pub fn init(environment_id: &EnvironmentId, query: Vec<(String, String)>) -> Self {
        Self {
            method: SyncMethod::Post,
            path: format!("/{environment_id}/sync/init"),
            query,
            headers: Vec::new(),
        }
    }

    /// Returns the value of a request header (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Raw outcome of one HTTP exchange
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Reason phrase of the status line, if known
    pub reason_phrase: Option<String>,
    /// Response headers in received order (names may repeat)
    pub headers: Vec<(String, String)>,
    /// Response body bytes
    pub body: Vec<u8>,
    /// Absolute URL the request was sent to
    pub url: String,
}

impl RawResponse {
    /// Returns true for 2xx status codes
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns the first value of a header (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Failure to obtain any HTTP response
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The connection could not be established
    #[error("Connection failed: {0}")]
    Connect(String),

    /// The host name could not be resolved
    #[error("DNS resolution failed: {0}")]
    Dns(String),

    /// A socket-level I/O error occurred mid-exchange
    #[error("Socket error: {0}")]
    Io(String),

    /// The attempt timed out or was aborted by the HTTP stack
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Any other transport failure
    #[error("Transport error: {0}")]
    Other(String),
}

impl TransportError {
    /// Connection refused, DNS failure, socket error
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            TransportError::Connect(_) | TransportError::Dns(_) | TransportError::Io(_)
        )
    }

    /// Timed out or aborted
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout(_))
    }
}

/// Port trait for the HTTP transport
///
/// ## Implementation Notes
///
/// - One call is one attempt: implementations must not retry.
/// - Non-2xx responses are `Ok`; only the absence of a response is `Err`.
/// - Implementations add the endpoint base URL and any authentication headers.
#[async_trait::async_trait]
pub trait ISyncTransport: Send + Sync {
    /// Sends a request and returns the raw response
    async fn send(&self, request: &SyncRequest) -> Result<RawResponse, TransportError>;

    /// Absolute URL a request would be sent to
    ///
    /// Used to label failures that never produced a response.
    fn request_url(&self, request: &SyncRequest) -> String {
        request.path.clone()
    }
}
