//! The optimistic resource cache.
//!
//! [`CacheStore`] owns every cached collection; [`MutationCoordinator`] wraps
//! remote writes in snapshot / optimistic apply / confirm-or-rollback.
//!
//! # Ordering
//!
//! Optimistic patches are applied under the store's write lock in call order.
//! Remote confirmations are not serialized: when two writes to the same key are
//! in flight, each holds the snapshot taken when it started, and a failure
//! restores that snapshot even if the other write has since committed. This is
//! acceptable for one creator editing their own page and is left as is.

mod coordinator;
mod store;

pub use coordinator::{MutationCoordinator, MutationKind, PendingMutation};
pub use store::{CacheStore, Collection};

use crate::models::CollectionKey;

/// What happened to a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheChange {
    /// The whole collection was replaced (load, reorder).
    Replaced,
    /// A record was appended.
    Appended,
    /// One or more records were replaced in place.
    Patched,
    /// One or more records were removed.
    Removed,
    /// A failed write restored the pre-mutation snapshot.
    RolledBack,
    /// The collection was dropped from the cache.
    Evicted,
}

impl CacheChange {
    /// Returns the change name used in logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Replaced => "replaced",
            Self::Appended => "appended",
            Self::Patched => "patched",
            Self::Removed => "removed",
            Self::RolledBack => "rolled_back",
            Self::Evicted => "evicted",
        }
    }
}

/// Notification that a cached collection changed.
///
/// Subscribers re-read the collection from the store; the event itself only
/// carries the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEvent {
    /// The collection that changed.
    pub key: CollectionKey,
    /// The kind of change.
    pub change: CacheChange,
    /// Number of records after the change.
    pub len: usize,
}
