//! Profile links.

use super::record::require;
use super::{Draft, OrderedRecord, Record, RecordId, ResourceKind};
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const fn default_active() -> bool {
    true
}

/// A link shown on a creator's public page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// Server-assigned identifier.
    #[serde(rename = "_id")]
    pub id: RecordId,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Target URL.
    #[serde(default)]
    pub url: String,
    /// Zero-based display position.
    #[serde(default)]
    pub sort_order: u32,
    /// Whether the link is visible on the public page.
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Optional thumbnail image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// Fields the editor does not interpret (feed data, click counts, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for Link {
    const KIND: ResourceKind = ResourceKind::Links;

    fn id(&self) -> &RecordId {
        &self.id
    }
}

impl OrderedRecord for Link {
    type Draft = LinkDraft;

    fn sort_order(&self) -> u32 {
        self.sort_order
    }

    fn set_sort_order(&mut self, sort_order: u32) {
        self.sort_order = sort_order;
    }

    fn provisional(draft: &LinkDraft, sort_order: u32) -> Self {
        Self {
            id: RecordId::provisional(),
            title: draft.title.clone(),
            url: draft.url.clone(),
            sort_order,
            is_active: draft.is_active,
            thumbnail_url: draft.thumbnail_url.clone(),
            extra: Map::new(),
        }
    }
}

/// Payload for creating a link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDraft {
    /// Display title (required).
    pub title: String,
    /// Target URL (required).
    pub url: String,
    /// New links are visible unless stated otherwise.
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Optional thumbnail image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

impl LinkDraft {
    /// Creates an active link draft.
    #[must_use]
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            is_active: true,
            thumbnail_url: None,
        }
    }
}

impl Draft for LinkDraft {
    fn validate(&self) -> Result<()> {
        require("title", &self.title)?;
        require("url", &self.url)
    }
}
