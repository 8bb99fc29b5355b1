//! Change records returned by the delta endpoint
//!
//! Every entity category (items, assets, types, languages, taxonomies)
//! shares the same record shape: a change type plus an opaque payload.
//! [`ChangeRecord`] is generic over a zero-sized category marker so that a
//! page can keep the categories apart at the type level without five
//! near-identical record definitions.

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Kind of change that happened to a synchronized entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    /// The entity was created
    Created,
    /// The entity was updated
    Updated,
    /// The entity was deleted
    Deleted,
    /// The entity was created or updated (compacted protocol variant)
    Changed,
}

impl ChangeType {
    /// Returns true if the record removes the entity
    pub fn is_deletion(&self) -> bool {
        matches!(self, ChangeType::Deleted)
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeType::Created => write!(f, "created"),
            ChangeType::Updated => write!(f, "updated"),
            ChangeType::Deleted => write!(f, "deleted"),
            ChangeType::Changed => write!(f, "changed"),
        }
    }
}

// ============================================================================
// Entity categories
// ============================================================================

/// Marker trait for the entity categories tracked by the Sync API
pub trait EntityCategory:
    fmt::Debug + Clone + Copy + PartialEq + Eq + Default + Send + Sync + 'static
{
    /// JSON field name of the category inside a delta page
    const NAME: &'static str;
}

/// Content items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Item;

/// Assets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Asset;

/// Content types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContentType;

/// Languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Language;

/// Taxonomy groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Taxonomy;

impl EntityCategory for Item {
    const NAME: &'static str = "items";
}

impl EntityCategory for Asset {
    const NAME: &'static str = "assets";
}

impl EntityCategory for ContentType {
    const NAME: &'static str = "types";
}

impl EntityCategory for Language {
    const NAME: &'static str = "languages";
}

impl EntityCategory for Taxonomy {
    const NAME: &'static str = "taxonomies";
}

// ============================================================================
// ChangeRecord
// ============================================================================

/// A single change of an entity in category `C`
///
/// The payload is kept as an undecoded JSON value; callers decode it
/// against a shape of their choosing with [`ChangeRecord::decode_data`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct ChangeRecord<C: EntityCategory> {
    /// What happened to the entity
    change_type: ChangeType,

    /// Opaque entity payload (may be absent for deletions)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,

    #[serde(skip)]
    category: PhantomData<C>,
}

impl<C: EntityCategory> ChangeRecord<C> {
    /// Creates a record with the given change type and payload
    pub fn new(change_type: ChangeType, data: Option<serde_json::Value>) -> Self {
        Self {
            change_type,
            data,
            category: PhantomData,
        }
    }

    /// Returns the change type
    pub fn change_type(&self) -> ChangeType {
        self.change_type
    }

    /// Returns the raw payload, if any
    pub fn data(&self) -> Option<&serde_json::Value> {
        self.data.as_ref()
    }

    /// Returns the JSON name of this record's category
    pub fn category(&self) -> &'static str {
        C::NAME
    }

    /// Decodes the payload into a caller-chosen shape
    ///
    /// Returns `Ok(None)` when the record carries no payload (or a JSON `null`).
    pub fn decode_data<T: DeserializeOwned>(&self) -> Result<Option<T>, serde_json::Error> {
        match &self.data {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(value) => T::deserialize(value).map(Some),
        }
    }
}
