//! Record identifiers and cache keys.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix of ids synthesized for records whose create is still in flight.
const PROVISIONAL_PREFIX: &str = "pending-";

/// Server-assigned unique identifier of a record (the API's `_id`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Creates a record ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates a client-side placeholder id for an optimistic create.
    #[must_use]
    pub fn provisional() -> Self {
        Self(format!("{PROVISIONAL_PREFIX}{}", uuid::Uuid::new_v4()))
    }

    /// Whether this id was synthesized locally and has no server counterpart.
    #[must_use]
    pub fn is_provisional(&self) -> bool {
        self.0.starts_with(PROVISIONAL_PREFIX)
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of the creator who owns a cached collection (the profile `_id`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    /// Creates an owner ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&RecordId> for OwnerId {
    fn from(id: &RecordId) -> Self {
        Self(id.as_str().to_string())
    }
}

/// The kinds of server-owned resources the editor caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Profile links, ordered.
    Links,
    /// Shop products, ordered.
    Products,
    /// The creator's own profile (a single record).
    Profile,
}

impl ResourceKind {
    /// Returns all resource kinds.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Links, Self::Products, Self::Profile]
    }

    /// Returns the resource name used in cache keys and logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Links => "links",
            Self::Products => "products",
            Self::Profile => "profile",
        }
    }

    /// Parses a resource name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "links" | "link" => Some(Self::Links),
            "products" | "product" | "shop" => Some(Self::Products),
            "profile" | "profiles" => Some(Self::Profile),
            _ => None,
        }
    }

    /// Path of the owner-scoped collection (`GET` lists, `POST` creates).
    #[must_use]
    pub const fn collection_path(&self) -> &'static str {
        match self {
            Self::Links => "/links",
            Self::Products => "/products",
            Self::Profile => "/profiles/me",
        }
    }

    /// Path of a single record.
    ///
    /// The profile is always addressed through `/profiles/me`.
    #[must_use]
    pub fn item_path(&self, id: &RecordId) -> String {
        match self {
            Self::Links | Self::Products => format!("{}/{id}", self.collection_path()),
            Self::Profile => self.collection_path().to_string(),
        }
    }

    /// Path of the bulk reorder endpoint, if the resource is ordered.
    #[must_use]
    pub const fn reorder_path(&self) -> Option<&'static str> {
        match self {
            Self::Links => Some("/links/reorder"),
            Self::Products => Some("/products/reorder"),
            Self::Profile => None,
        }
    }

    /// Path of the unauthenticated listing for a public page.
    ///
    /// Public profiles are looked up by username, not owner.
    #[must_use]
    pub fn public_path(&self, owner: &OwnerId) -> Option<String> {
        match self {
            Self::Links => Some(format!("/links/public/{owner}")),
            Self::Products => Some(format!("/products/public/{owner}")),
            Self::Profile => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identifies one cached collection: a resource type scoped to one owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionKey {
    /// The resource type.
    pub resource: ResourceKind,
    /// The owning creator.
    pub owner: OwnerId,
}

impl CollectionKey {
    /// Creates a collection key.
    #[must_use]
    pub fn new(resource: ResourceKind, owner: impl Into<OwnerId>) -> Self {
        Self {
            resource,
            owner: owner.into(),
        }
    }
}

impl From<&str> for OwnerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for OwnerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.owner)
    }
}
