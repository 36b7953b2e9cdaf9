//! The creator profile.

use super::{Record, RecordId, ResourceKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A creator's profile, including appearance settings.
///
/// Cached as a one-element collection under [`ResourceKind::Profile`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Server-assigned identifier; also the owner id of links and products.
    #[serde(rename = "_id")]
    pub id: RecordId,
    /// Public handle.
    #[serde(default)]
    pub username: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    /// Short biography.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    /// Avatar image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Appearance, social icons and anything else the editor passes through.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for Profile {
    const KIND: ResourceKind = ResourceKind::Profile;

    fn id(&self) -> &RecordId {
        &self.id
    }
}

impl Profile {
    /// Returns the name to display, falling back to the handle.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.username)
    }
}
