//! Named sync client registry
//!
//! Builds one [`SyncClient`] per configured name at startup. Consumers get
//! shared handles by name; there is no process-wide lookup.

use std::collections::BTreeMap;
use std::sync::Arc;

use kontent_sync_core::config::{Config, SyncOptions, ValidationError};
use kontent_sync_core::retry::RetryPolicy;
use kontent_sync_core::usecases::SyncClient;
use thiserror::Error;
use tracing::{debug, info};

use crate::transport::ReqwestTransport;

/// Name used when the caller does not pick a client
pub const DEFAULT_CLIENT_NAME: &str = "default";

/// Errors raised while building or querying the registry
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// No client is registered under the name
    #[error("No sync client registered with name '{0}'")]
    NotRegistered(String),

    /// The name is empty or whitespace
    #[error("Client name must not be blank")]
    InvalidName,

    /// A client with the name already exists
    #[error("A sync client named '{0}' is already registered")]
    AlreadyRegistered(String),

    /// The options of a client failed validation
    #[error("Sync client '{name}' is misconfigured: {}", join_errors(.errors))]
    InvalidConfiguration {
        name: String,
        errors: Vec<ValidationError>,
    },
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Builds a client from validated options
///
/// # Errors
///
/// [`RegistryError::InvalidConfiguration`] listing every validation error.
pub fn build_client(options: &SyncOptions) -> Result<SyncClient, RegistryError> {
    build_named_client(DEFAULT_CLIENT_NAME, options)
}

fn build_named_client(name: &str, options: &SyncOptions) -> Result<SyncClient, RegistryError> {
    let invalid = |errors| RegistryError::InvalidConfiguration {
        name: name.to_string(),
        errors,
    };

    let errors = options.validate();
    if !errors.is_empty() {
        return Err(invalid(errors));
    }
    let environment_id = options.parsed_environment_id().map_err(|e| {
        invalid(vec![ValidationError {
            field: "environment_id".into(),
            message: e.to_string(),
        }])
    })?;

    let transport = ReqwestTransport::from_options(options);
    debug!(
        client = name,
        endpoint = transport.base_url(),
        api_mode = %options.api_mode,
        retry = options.retry.enabled,
        "Built sync client"
    );

    Ok(SyncClient::new(
        Arc::new(transport),
        environment_id,
        RetryPolicy::new(&options.retry),
    ))
}

/// Sync clients keyed by name
#[derive(Debug, Default)]
pub struct SyncClientRegistry {
    clients: BTreeMap<String, Arc<SyncClient>>,
}

impl SyncClientRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a client for every entry in `config.clients`
    ///
    /// # Errors
    ///
    /// Fails on the first blank name or invalid entry.
    pub fn from_config(config: &Config) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for (name, options) in &config.clients {
            registry.register(name, options)?;
        }
        info!(clients = registry.len(), "Sync client registry ready");
        Ok(registry)
    }

    /// Validates `options` and registers a client under `name`
    pub fn register(
        &mut self,
        name: &str,
        options: &SyncOptions,
    ) -> Result<Arc<SyncClient>, RegistryError> {
        let name = checked_name(name)?;
        if self.clients.contains_key(name) {
            return Err(RegistryError::AlreadyRegistered(name.to_string()));
        }
        let client = build_named_client(name, options)?;
        self.insert(name, client)
    }

    /// Registers a prebuilt client (e.g. one with a custom transport)
    pub fn register_client(
        &mut self,
        name: &str,
        client: SyncClient,
    ) -> Result<Arc<SyncClient>, RegistryError> {
        let name = checked_name(name)?;
        if self.clients.contains_key(name) {
            return Err(RegistryError::AlreadyRegistered(name.to_string()));
        }
        self.insert(name, client)
    }

    fn insert(&mut self, name: &str, client: SyncClient) -> Result<Arc<SyncClient>, RegistryError> {
        let client = Arc::new(client);
        self.clients.insert(name.to_string(), Arc::clone(&client));
        Ok(client)
    }

    /// Returns the client registered under `name`
    pub fn get(&self, name: &str) -> Result<Arc<SyncClient>, RegistryError> {
        let name = checked_name(name)?;
        self.clients
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotRegistered(name.to_string()))
    }

    /// Returns the client registered under [`DEFAULT_CLIENT_NAME`]
    pub fn default_client(&self) -> Result<Arc<SyncClient>, RegistryError> {
        self.get(DEFAULT_CLIENT_NAME)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.clients.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

fn checked_name(name: &str) -> Result<&str, RegistryError> {
    if name.trim().is_empty() {
        Err(RegistryError::InvalidName)
    } else {
        Ok(name)
    }
}
