//! Payloads of the Sync API endpoints
//!
//! - [`InitAck`] - acknowledgement of `POST /sync/init` (the body is empty,
//!   the first token travels in the `X-Continuation` header)
//! - [`DeltaPage`] - one bounded batch of changes from `GET /sync`
//!
//! Both implement [`SyncPayload`], which is how the result envelope decodes
//! response bodies and infers whether more pages are waiting.

use serde::de::Error as _;
use serde::{Deserialize, Serialize};

use super::change::{Asset, ChangeRecord, ContentType, Item, Language, Taxonomy};

/// Maximum number of records returned per entity category in one delta page
///
/// When any category of a page reaches this size, more changes are likely
/// waiting behind the continuation token.
pub const MAX_ITEMS_PER_ENTITY_TYPE: usize = 100;

/// A response body the sync client knows how to decode
pub trait SyncPayload: Sized + Default + Send {
    /// Decodes a successful response body
    ///
    /// An `Err` means the body must not be trusted, even though the status
    /// code reported success.
    fn decode(body: &[u8]) -> Result<Self, serde_json::Error>;

    /// Whether the payload indicates that another page is likely available
    fn has_more_changes(&self) -> bool {
        false
    }
}

// ============================================================================
// InitAck
// ============================================================================

/// Acknowledgement of a sync initialization
///
/// Carries no data; the continuation token is read from the response headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InitAck;

impl SyncPayload for InitAck {
    fn decode(body: &[u8]) -> Result<Self, serde_json::Error> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(InitAck);
        }
        // Whatever JSON the server sends is ignored, but it has to be JSON
        serde_json::from_slice::<serde_json::Value>(body).map(|_| InitAck)
    }
}

// ============================================================================
// DeltaPage
// ============================================================================

/// One page of changes returned by the delta endpoint
///
/// Categories absent from the response body decode as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeltaPage {
    /// Changed content items
    #[serde(default)]
    pub items: Vec<ChangeRecord<Item>>,
    /// Changed assets (not sent by every protocol version)
    #[serde(default)]
    pub assets: Vec<ChangeRecord<Asset>>,
    /// Changed content types
    #[serde(default)]
    pub types: Vec<ChangeRecord<ContentType>>,
    /// Changed languages
    #[serde(default)]
    pub languages: Vec<ChangeRecord<Language>>,
    /// Changed taxonomy groups
    #[serde(default)]
    pub taxonomies: Vec<ChangeRecord<Taxonomy>>,
}

impl DeltaPage {
    /// Record counts per category, in wire order
    pub fn category_counts(&self) -> [(&'static str, usize); 5] {
        [
            ("items", self.items.len()),
            ("assets", self.assets.len()),
            ("types", self.types.len()),
            ("languages", self.languages.len()),
            ("taxonomies", self.taxonomies.len()),
        ]
    }

    /// Total number of change records across all categories
    pub fn total_changes(&self) -> usize {
        self.category_counts().iter().map(|(_, count)| count).sum()
    }

    /// Returns true if the page carries no changes at all
    pub fn is_empty(&self) -> bool {
        self.total_changes() == 0
    }
}

impl SyncPayload for DeltaPage {
    fn decode(body: &[u8]) -> Result<Self, serde_json::Error> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(serde_json::Error::custom("delta response body is empty"));
        }
        serde_json::from_slice::<Option<DeltaPage>>(body)?
            .ok_or_else(|| serde_json::Error::custom("delta response body is null"))
    }

    fn has_more_changes(&self) -> bool {
        self.category_counts()
            .iter()
            .any(|(_, count)| *count >= MAX_ITEMS_PER_ENTITY_TYPE)
    }
}
