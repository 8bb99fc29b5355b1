//! Domain newtypes with validation
//!
//! Strongly-typed wrappers for the values the sync protocol passes around.
//! Each newtype ensures data validity at construction time.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

// ============================================================================
// SyncToken
// ============================================================================

/// Opaque continuation token issued by the Sync API
///
/// The token marks the caller's position in the change stream. It has no
/// defined internal structure: it is stored and forwarded, never parsed.
/// The only invariant enforced is that it is not blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SyncToken(String);

impl SyncToken {
    /// Create a new SyncToken
    ///
    /// # Errors
    /// Returns error if the token is empty or consists only of whitespace
    pub fn new(token: impl Into<String>) -> Result<Self, DomainError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(DomainError::InvalidSyncToken(
                "Sync token cannot be empty or whitespace".to_string(),
            ));
        }

        Ok(Self(token))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SyncToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SyncToken {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for SyncToken {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<SyncToken> for String {
    fn from(token: SyncToken) -> Self {
        token.0
    }
}

// ============================================================================
// EnvironmentId
// ============================================================================

/// Identifier of a Kontent.ai environment
///
/// Must be a well-formed GUID and must not be the nil GUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EnvironmentId(Uuid);

impl EnvironmentId {
    /// Create an EnvironmentId from an existing UUID
    ///
    /// # Errors
    /// Returns error if the UUID is nil
    pub fn from_uuid(uuid: Uuid) -> Result<Self, DomainError> {
        if uuid.is_nil() {
            return Err(DomainError::InvalidEnvironmentId(
                "Environment ID cannot be an empty GUID".to_string(),
            ));
        }
        Ok(Self(uuid))
    }

    /// Get the inner UUID value
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Display for EnvironmentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        // Hyphenated lowercase, as used in API paths
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for EnvironmentId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::parse_str(s.trim())
            .map_err(|e| DomainError::InvalidEnvironmentId(format!("'{s}' is not a GUID: {e}")))?;
        Self::from_uuid(uuid)
    }
}

impl TryFrom<String> for EnvironmentId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<EnvironmentId> for String {
    fn from(id: EnvironmentId) -> Self {
        id.to_string()
    }
}
