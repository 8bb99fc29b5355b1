//! Configuration module for kontent-sync.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder for programmatic use.
//!
//! A configuration file holds any number of named clients:
//!
//! ```yaml
//! clients:
//!   default:
//!     environment_id: 975bf280-fd91-488c-994c-2f04416e5ee3
//!   preview:
//!     environment_id: 975bf280-fd91-488c-994c-2f04416e5ee3
//!     api_mode: preview
//!     api_key: ew0KICAiYWxnIjo...
//!     retry:
//!       max_retries: 5
//! logging:
//!   level: debug
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::{DomainError, EnvironmentId};

/// Default endpoint of the public and secured Delivery API
pub const DEFAULT_PRODUCTION_ENDPOINT: &str = "https://deliver.kontent.ai";

/// Default endpoint of the Preview Delivery API
pub const DEFAULT_PREVIEW_ENDPOINT: &str = "https://preview-deliver.kontent.ai";

/// Upper bound accepted for `retry.max_retries`
pub const MAX_RETRIES_LIMIT: u32 = 10;

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for kontent-sync.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Named client configurations.
    pub clients: BTreeMap<String, SyncOptions>,
    pub logging: LoggingConfig,
}

/// Which Delivery API a client talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiMode {
    /// Public production API, no credentials
    #[default]
    Public,
    /// Preview API, requires a preview API key
    Preview,
    /// Secured production API, requires a secure access key
    Secure,
}

impl ApiMode {
    /// Returns true if requests must carry an API key
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, ApiMode::Public)
    }
}

impl std::fmt::Display for ApiMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiMode::Public => write!(f, "public"),
            ApiMode::Preview => write!(f, "preview"),
            ApiMode::Secure => write!(f, "secure"),
        }
    }
}

/// Settings of one named sync client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncOptions {
    /// Environment GUID.
    pub environment_id: String,
    pub api_mode: ApiMode,
    /// Preview or secure access key. Ignored in public mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub production_endpoint: String,
    pub preview_endpoint: String,
    pub retry: RetryConfig,
}

/// Retry/backoff settings of a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// When false, failures surface after the first attempt.
    pub enabled: bool,
    /// Retries beyond the initial attempt.
    pub max_retries: u32,
    /// Delay before the first retry (in milliseconds).
    pub base_delay_ms: u64,
    /// Ceiling for any single backoff delay (in milliseconds).
    pub max_delay_ms: u64,
    /// Randomize each delay to spread out concurrent clients.
    pub jitter: bool,
    /// Ceiling for a single HTTP attempt (in seconds).
    pub attempt_timeout_secs: u64,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/kontent-sync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("kontent-sync")
            .join("config.yaml")
    }

    /// Returns the options registered under `name`.
    pub fn client(&self, name: &str) -> Option<&SyncOptions> {
        self.clients.get(name)
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            environment_id: String::new(),
            api_mode: ApiMode::Public,
            api_key: None,
            production_endpoint: DEFAULT_PRODUCTION_ENDPOINT.to_string(),
            preview_endpoint: DEFAULT_PREVIEW_ENDPOINT.to_string(),
            retry: RetryConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retries: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
            jitter: true,
            attempt_timeout_secs: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl SyncOptions {
    /// Endpoint requests are sent to: the preview endpoint in preview mode,
    /// otherwise the production endpoint.
    pub fn active_endpoint(&self) -> &str {
        match self.api_mode {
            ApiMode::Preview => &self.preview_endpoint,
            ApiMode::Public | ApiMode::Secure => &self.production_endpoint,
        }
    }

    /// Parses the configured environment GUID.
    pub fn parsed_environment_id(&self) -> Result<EnvironmentId, DomainError> {
        self.environment_id.parse()
    }

    /// API key to send, if the mode requires one.
    pub fn effective_api_key(&self) -> Option<&str> {
        if self.api_mode.requires_api_key() {
            self.api_key.as_deref().filter(|key| !key.trim().is_empty())
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"retry.max_retries"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

fn validate_endpoint(field: &str, value: &str, errors: &mut Vec<ValidationError>) {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("must be an absolute http(s) URL, got scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(
            field,
            format!("invalid URL '{value}': {e}"),
        )),
    }
}

impl RetryConfig {
    /// Validate the retry settings and return all errors found.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.attempt_timeout_secs == 0 {
            errors.push(ValidationError::new(
                "retry.attempt_timeout_secs",
                "must be greater than 0",
            ));
        }
        if self.enabled && self.base_delay_ms == 0 {
            errors.push(ValidationError::new(
                "retry.base_delay_ms",
                "must be greater than 0 when retries are enabled",
            ));
        }
        if self.max_delay_ms < self.base_delay_ms {
            errors.push(ValidationError::new(
                "retry.max_delay_ms",
                format!(
                    "must be >= base_delay_ms ({}), got {}",
                    self.base_delay_ms, self.max_delay_ms
                ),
            ));
        }
        if self.max_retries > MAX_RETRIES_LIMIT {
            errors.push(ValidationError::new(
                "retry.max_retries",
                format!("must be at most {MAX_RETRIES_LIMIT}, got {}", self.max_retries),
            ));
        }

        errors
    }
}

impl SyncOptions {
    /// Validate the client settings and return all errors found.
    ///
    /// An empty vector means the options are valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if let Err(e) = self.parsed_environment_id() {
            errors.push(ValidationError::new("environment_id", e.to_string()));
        }

        if self.api_mode.requires_api_key() && self.effective_api_key().is_none() {
            errors.push(ValidationError::new(
                "api_key",
                format!("is required when api_mode is '{}'", self.api_mode),
            ));
        }

        validate_endpoint("production_endpoint", &self.production_endpoint, &mut errors);
        validate_endpoint("preview_endpoint", &self.preview_endpoint, &mut errors);

        errors.extend(self.retry.validate());
        errors
    }
}

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid. Client fields are
    /// reported as `clients.<name>.<field>`.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        for (name, options) in &self.clients {
            if name.trim().is_empty() {
                errors.push(ValidationError::new(
                    "clients",
                    "client names must not be blank",
                ));
                continue;
            }
            errors.extend(options.validate().into_iter().map(|e| ValidationError {
                field: format!("clients.{name}.{}", e.field),
                message: e.message,
            }));
        }

        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError::new(
                "logging.level",
                format!(
                    "must be one of {:?}, got '{}'",
                    VALID_LOG_LEVELS, self.logging.level
                ),
            ));
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// SyncOptionsBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing [`SyncOptions`] programmatically.
///
/// Starts from [`SyncOptions::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use kontent_sync_core::config::SyncOptionsBuilder;
///
/// let options = SyncOptionsBuilder::new()
///     .environment_id("975bf280-fd91-488c-994c-2f04416e5ee3")
///     .use_preview_api("preview-key")
///     .disable_retry_policy()
///     .build_validated()
///     .expect("valid options");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SyncOptionsBuilder {
    options: SyncOptions,
}

impl SyncOptionsBuilder {
    /// Create a new builder initialised with [`SyncOptions::default`] values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn environment_id(mut self, environment_id: impl Into<String>) -> Self {
        self.options.environment_id = environment_id.into();
        self
    }

    /// Public production API without credentials.
    pub fn use_production_api(mut self) -> Self {
        self.options.api_mode = ApiMode::Public;
        self.options.api_key = None;
        self
    }

    pub fn use_preview_api(mut self, api_key: impl Into<String>) -> Self {
        self.options.api_mode = ApiMode::Preview;
        self.options.api_key = Some(api_key.into());
        self
    }

    pub fn use_secure_api(mut self, api_key: impl Into<String>) -> Self {
        self.options.api_mode = ApiMode::Secure;
        self.options.api_key = Some(api_key.into());
        self
    }

    pub fn disable_retry_policy(mut self) -> Self {
        self.options.retry.enabled = false;
        self
    }

    /// Overrides the endpoint of the currently selected mode.
    ///
    /// Call after choosing the API mode.
    pub fn custom_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        match self.options.api_mode {
            ApiMode::Preview => self.options.preview_endpoint = endpoint.into(),
            ApiMode::Public | ApiMode::Secure => self.options.production_endpoint = endpoint.into(),
        }
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.options.retry = retry;
        self
    }

    /// Consume the builder and return the finished [`SyncOptions`].
    pub fn build(self) -> SyncOptions {
        self.options
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the options are invalid.
    pub fn build_validated(self) -> Result<SyncOptions, Vec<ValidationError>> {
        let options = self.build();
        let errors = options.validate();
        if errors.is_empty() {
            Ok(options)
        } else {
            Err(errors)
        }
    }
}
