//! reqwest-based Sync API transport
//!
//! One `send` call is one HTTP exchange. The transport owns the endpoint
//! base URL and the API key; retries, classification and decoding happen in
//! `kontent-sync-core`.

use async_trait::async_trait;
use kontent_sync_core::config::SyncOptions;
use kontent_sync_core::ports::{
    ISyncTransport, RawResponse, SyncMethod, SyncRequest, TransportError,
};
use reqwest::{Client, Method};
use tracing::{debug, trace};
use url::Url;

/// Sync API transport over `reqwest`
#[derive(Clone)]
pub struct ReqwestTransport {
    /// The underlying HTTP client
    client: Client,
    /// Endpoint requests are sent to, without trailing slash
    base_url: String,
    /// Bearer token for preview/secure modes
    api_key: Option<String>,
}

impl ReqwestTransport {
    /// Creates an unauthenticated transport for `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
        }
    }

    /// Creates a transport for the active endpoint and key of `options`
    pub fn from_options(options: &SyncOptions) -> Self {
        let transport = Self::new(options.active_endpoint());
        match options.effective_api_key() {
            Some(key) => transport.with_api_key(key),
            None => transport,
        }
    }

    /// Sends `Authorization: Bearer <key>` with every request
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Replaces the underlying HTTP client (proxies, TLS settings, pooling)
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Returns the endpoint base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns true if requests carry credentials
    pub fn is_authenticated(&self) -> bool {
        self.api_key.is_some()
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

#[async_trait]
impl ISyncTransport for ReqwestTransport {
    async fn send(&self, request: &SyncRequest) -> Result<RawResponse, TransportError> {
        let url = format!("{}{}", self.base_url, request.path);
        let method = match request.method {
            SyncMethod::Get => Method::GET,
            SyncMethod::Post => Method::POST,
        };

        debug!(method = %request.method, url = %url, "Sending Sync API request");

        let mut builder = self.client.request(method, &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        let final_url = response.url().to_string();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(map_reqwest_error)?.to_vec();

        trace!(
            status = status.as_u16(),
            bytes = body.len(),
            url = %final_url,
            "Sync API response received"
        );

        Ok(RawResponse {
            status: status.as_u16(),
            reason_phrase: status.canonical_reason().map(str::to_string),
            headers,
            body,
            url: final_url,
        })
    }

    fn request_url(&self, request: &SyncRequest) -> String {
        let url = format!("{}{}", self.base_url, request.path);
        if request.query.is_empty() {
            return url;
        }
        match Url::parse_with_params(&url, &request.query) {
            Ok(parsed) => parsed.to_string(),
            Err(_) => url,
        }
    }
}

/// Maps a `reqwest` failure onto the transport error kinds the classifier
/// understands
fn map_reqwest_error(error: reqwest::Error) -> TransportError {
    let message = error_chain(&error);

    if error.is_timeout() {
        TransportError::Timeout(message)
    } else if error.is_connect() {
        if message.to_ascii_lowercase().contains("dns") {
            TransportError::Dns(message)
        } else {
            TransportError::Connect(message)
        }
    } else if error.is_request() || error.is_body() {
        TransportError::Io(message)
    } else {
        TransportError::Other(message)
    }
}

/// Flattens an error and its sources into one line
fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
