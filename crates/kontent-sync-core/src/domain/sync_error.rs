//! Normalized API errors and their classification
//!
//! Every failed API call, whatever went wrong, is turned into one
//! [`SyncError`] carrying a [`SyncErrorReason`]. Classification is a pure
//! function of the failed response: the same inputs always produce an
//! identical error.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ports::transport::TransportError;

/// Message used when neither the body, the status line nor the transport
/// offer anything better
pub const GENERIC_ERROR_MESSAGE: &str = "An unknown error occurred.";

/// Why a sync operation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncErrorReason {
    /// Unknown or unspecified error
    Unknown,
    /// The API response was invalid or could not be parsed
    InvalidResponse,
    /// The requested resource was not found (404)
    NotFound,
    /// Authentication failed or credentials are invalid (401/403)
    Unauthorized,
    /// Too many requests (429)
    RateLimited,
    /// The request timed out
    Timeout,
    /// Connection failed, DNS resolution failed, socket error
    NetworkError,
    /// The sync token is invalid or expired
    InvalidSyncToken,
    /// The client configuration is invalid
    InvalidConfiguration,
    /// The server failed (5xx)
    ServerError,
}

impl SyncErrorReason {
    /// Derives a reason from an HTTP status code alone
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => SyncErrorReason::Unauthorized,
            404 => SyncErrorReason::NotFound,
            408 => SyncErrorReason::Timeout,
            429 => SyncErrorReason::RateLimited,
            500 | 502 | 503 | 504 => SyncErrorReason::ServerError,
            400..=499 => SyncErrorReason::InvalidResponse,
            500..=599 => SyncErrorReason::ServerError,
            _ => SyncErrorReason::Unknown,
        }
    }
}

impl fmt::Display for SyncErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncErrorReason::Unknown => "unknown",
            SyncErrorReason::InvalidResponse => "invalid_response",
            SyncErrorReason::NotFound => "not_found",
            SyncErrorReason::Unauthorized => "unauthorized",
            SyncErrorReason::RateLimited => "rate_limited",
            SyncErrorReason::Timeout => "timeout",
            SyncErrorReason::NetworkError => "network_error",
            SyncErrorReason::InvalidSyncToken => "invalid_sync_token",
            SyncErrorReason::InvalidConfiguration => "invalid_configuration",
            SyncErrorReason::ServerError => "server_error",
        };
        write!(f, "{s}")
    }
}

// ============================================================================
// ErrorBody
// ============================================================================

/// Structured error body sent by the Sync API
///
/// Field names are matched case-insensitively; unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorBody {
    /// Human-readable message
    pub message: String,
    /// Server-side request identifier
    pub request_id: Option<String>,
    /// Numeric error code
    pub error_code: Option<i64>,
    /// More specific error code
    pub specific_code: Option<i64>,
}

impl ErrorBody {
    /// Parses a raw error body
    ///
    /// Returns `None` when the body is not a JSON object or when a known
    /// field holds a value of the wrong type.
    pub fn parse(raw: &[u8]) -> Option<Self> {
        let value: Value = serde_json::from_slice(raw).ok()?;
        let object = value.as_object()?;

        Some(Self {
            message: string_field(object, "message")?.unwrap_or_default(),
            request_id: string_field(object, "request_id")?,
            error_code: int_field(object, "error_code")?,
            specific_code: int_field(object, "specific_code")?,
        })
    }
}

fn lookup<'a>(object: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    object
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value)
}

// Outer None = type mismatch, inner None = absent or null
fn string_field(object: &Map<String, Value>, name: &str) -> Option<Option<String>> {
    match lookup(object, name) {
        None | Some(Value::Null) => Some(None),
        Some(Value::String(s)) => Some(Some(s.clone())),
        Some(_) => None,
    }
}

fn int_field(object: &Map<String, Value>, name: &str) -> Option<Option<i64>> {
    match lookup(object, name) {
        None | Some(Value::Null) => Some(None),
        Some(v) => v.as_i64().map(Some),
    }
}

// ============================================================================
// SyncError
// ============================================================================

/// A failed API call, normalized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncError {
    /// Human-readable message
    pub message: String,
    /// Server-side request identifier, if the API sent one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Numeric error code (the API's own, or the HTTP status)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i64>,
    /// More specific error code sent by the API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specific_code: Option<i64>,
    /// Classified reason
    pub reason: SyncErrorReason,
    /// Underlying cause (transport or decoding failure), if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl SyncError {
    /// Creates an error with a message and reason and nothing else
    pub fn new(message: impl Into<String>, reason: SyncErrorReason) -> Self {
        Self {
            message: message.into(),
            request_id: None,
            error_code: None,
            specific_code: None,
            reason,
            cause: None,
        }
    }

    /// Attaches an underlying cause
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Attaches a numeric error code
    pub fn with_error_code(mut self, code: i64) -> Self {
        self.error_code = Some(code);
        self
    }

    /// Classifies a failed response
    ///
    /// `status` is `0` when no HTTP response was received at all.
    ///
    /// Message precedence: structured body, raw body text, reason phrase,
    /// transport error message, generic message. Reason precedence:
    /// connectivity failures, then timeouts, then the HTTP status.
    pub fn classify(
        status: u16,
        reason_phrase: Option<&str>,
        body: Option<&[u8]>,
        transport_error: Option<&TransportError>,
    ) -> Self {
        let reason = match transport_error {
            Some(e) if e.is_connectivity() => SyncErrorReason::NetworkError,
            Some(e) if e.is_timeout() => SyncErrorReason::Timeout,
            _ => SyncErrorReason::from_status(status),
        };
        let status_code = (status != 0).then_some(i64::from(status));
        let cause = transport_error.map(ToString::to_string);

        let body = body.filter(|b| !b.iter().all(u8::is_ascii_whitespace));

        let mut error = match body {
            Some(raw) => match ErrorBody::parse(raw) {
                Some(parsed) => Self {
                    message: parsed.message,
                    request_id: parsed.request_id,
                    error_code: parsed.error_code.or(status_code),
                    specific_code: parsed.specific_code,
                    reason,
                    cause,
                },
                None => Self {
                    message: String::from_utf8_lossy(raw).into_owned(),
                    request_id: None,
                    error_code: status_code,
                    specific_code: None,
                    reason,
                    cause,
                },
            },
            None => Self {
                message: String::new(),
                request_id: None,
                error_code: status_code,
                specific_code: None,
                reason,
                cause,
            },
        };

        if error.message.trim().is_empty() {
            error.message = reason_phrase
                .filter(|p| !p.trim().is_empty())
                .map(str::to_owned)
                .or_else(|| transport_error.map(ToString::to_string))
                .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string());
        }

        error
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.reason, self.message)?;
        if let Some(code) = self.error_code {
            write!(f, " (code {code})")?;
        }
        if let Some(request_id) = &self.request_id {
            write!(f, " [request {request_id}]")?;
        }
        Ok(())
    }
}

impl std::error::Error for SyncError {}
