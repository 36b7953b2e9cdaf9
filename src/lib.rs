//! # Reachme
//!
//! Optimistic resource cache for the `ReachMe` link-in-bio editor.
//!
//! The editor keeps the signed-in creator's links, shop products and profile
//! in a local cache that mirrors the REST API. Writes are applied to the cache
//! immediately and rolled back if the server rejects them.
//!
//! ## Layers
//!
//! - [`cache::CacheStore`]: collections keyed by resource and owner
//! - [`cache::MutationCoordinator`]: snapshot, optimistic apply, confirm or roll back
//! - [`services::ResourceHook`]: typed add/update/remove/reorder per resource
//! - [`remote::HttpClient`]: the REST collaborator
//!
//! ## Example
//!
//! ```rust,ignore
//! use reachme::{EditorSession, ReachmeConfig, LinkDraft};
//!
//! let config = ReachmeConfig::load_default().with_env_overrides();
//! let session = EditorSession::connect(&config)?;
//! let link = session.links().add(LinkDraft::new("Blog", "https://example.com"))?;
//! session.links().reorder(&[link.id.clone()])?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod cache;
pub mod cli;
pub mod config;
pub mod models;
pub mod observability;
pub mod remote;
pub mod services;

pub use cache::{
    CacheChange, CacheEvent, CacheStore, Collection, MutationCoordinator, MutationKind,
    PendingMutation,
};
pub use config::{HttpSettings, ReachmeConfig};
pub use models::{
    Asset, CollectionKey, Draft, Link, LinkDraft, OrderedRecord, OwnerId, Product, ProductDraft,
    Profile, PublicPage, Record, RecordId, ResourceKind,
};
pub use remote::{AssetUploader, HttpClient, RemoteClient};
pub use services::{EditorSession, PublicPageLoader, ResourceHook};

/// Error type for reachme operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `Validation` | A create payload misses required fields, a reorder is not a permutation |
/// | `RemoteWrite` | A write was rejected or never reached the server; the cache was rolled back |
/// | `Request` | An HTTP call failed at the transport level or returned a non-success status |
/// | `Decode` | A server payload does not match the record schema |
/// | `OperationFailed` | Config files cannot be read, a cache lock is poisoned |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Input was rejected before any network call.
    ///
    /// No cache mutation happens when this is returned.
    #[error("invalid input: {0}")]
    Validation(String),

    /// A remote write failed and the optimistic change was rolled back.
    #[error("remote {kind} failed: {source}")]
    RemoteWrite {
        /// The mutation that was rolled back.
        kind: MutationKind,
        /// The underlying failure reported by the client.
        #[source]
        source: Box<Error>,
    },

    /// An HTTP request failed.
    #[error("{method} {path} failed: {cause}")]
    Request {
        /// HTTP method.
        method: &'static str,
        /// Request path relative to the API base URL.
        path: String,
        /// HTTP status, if a response was received.
        status: Option<u16>,
        /// Server-provided or transport error message.
        cause: String,
    },

    /// A server payload could not be decoded into a record.
    #[error("cannot decode {resource} payload: {cause}")]
    Decode {
        /// The resource being decoded.
        resource: &'static str,
        /// The underlying serde error.
        cause: String,
    },

    /// An operation failed.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Returns the HTTP status behind this error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => *status,
            Self::RemoteWrite { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Whether the cache was rolled back because of this error.
    #[must_use]
    pub const fn is_rollback(&self) -> bool {
        matches!(self, Self::RemoteWrite { .. })
    }
}

/// Result type alias for reachme operations.
pub type Result<T> = std::result::Result<T, Error>;
