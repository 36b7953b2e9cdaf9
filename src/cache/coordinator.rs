//! Mutation coordinator: optimistic writes with rollback.
//!
//! A mutation moves every record it touches through
//! `Committed -> Optimistic -> Committed`: the optimistic patch is applied to
//! the store before the remote call, and the call's outcome either reconciles
//! the patch with the server's answer or restores the pre-mutation snapshot.
//! Remote calls are attempted once; retrying is up to the caller.

use super::store::CacheStore;
use super::{CacheChange, Collection};
use crate::models::{CollectionKey, Record};
use crate::{Error, Result};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// The kind of remote write being coordinated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// `POST /{resource}`.
    Create,
    /// `PUT /{resource}/{id}`.
    Update,
    /// `DELETE /{resource}/{id}`.
    Delete,
    /// `PUT /{resource}/reorder`.
    Reorder,
    /// Server-side refresh of one record (dynamic feed links).
    Sync,
}

impl MutationKind {
    /// Returns the mutation name used in logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Reorder => "reorder",
            Self::Sync => "sync",
        }
    }

    /// The cache change an optimistic patch of this kind publishes.
    const fn change(self) -> CacheChange {
        match self {
            Self::Create => CacheChange::Appended,
            Self::Update | Self::Sync => CacheChange::Patched,
            Self::Delete => CacheChange::Removed,
            Self::Reorder => CacheChange::Replaced,
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An in-flight write whose optimistic patch is already visible.
///
/// Created by [`MutationCoordinator::begin`], consumed by
/// [`MutationCoordinator::settle`].
#[derive(Debug)]
#[must_use = "a pending mutation must be settled or the optimistic state is never confirmed"]
pub struct PendingMutation<T: Record> {
    key: CollectionKey,
    kind: MutationKind,
    snapshot: Option<Collection<T>>,
    started: Instant,
}

impl<T: Record> PendingMutation<T> {
    /// The collection being written.
    #[must_use]
    pub const fn key(&self) -> &CollectionKey {
        &self.key
    }

    /// The kind of write.
    #[must_use]
    pub const fn kind(&self) -> MutationKind {
        self.kind
    }

    /// The collection as it was before the optimistic patch, or `None` if
    /// nothing was cached yet.
    #[must_use]
    pub const fn snapshot(&self) -> Option<&Collection<T>> {
        self.snapshot.as_ref()
    }
}

/// Runs remote writes against a [`CacheStore`] with optimistic semantics.
#[derive(Debug, Clone)]
pub struct MutationCoordinator {
    store: Arc<CacheStore>,
}

impl MutationCoordinator {
    /// Creates a coordinator over a shared store.
    #[must_use]
    pub const fn new(store: Arc<CacheStore>) -> Self {
        Self { store }
    }

    /// The store mutations are applied to.
    #[must_use]
    pub const fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    /// Captures the snapshot and applies the optimistic patch.
    ///
    /// Both happen under one store lock, so no other write can land between
    /// them. If `optimistic` fails nothing is committed.
    ///
    /// # Errors
    ///
    /// Returns the error from `optimistic` or a poisoned-lock error.
    pub fn begin<T, P>(
        &self,
        key: &CollectionKey,
        kind: MutationKind,
        optimistic: P,
    ) -> Result<PendingMutation<T>>
    where
        T: Record,
        P: FnOnce(&[Arc<T>]) -> Result<Vec<Arc<T>>>,
    {
        let (snapshot, _) = self
            .store
            .update_entry(key, kind.change(), |current: &Collection<T>| {
                optimistic(current).map(Some)
            })?;
        tracing::debug!(%key, kind = kind.as_str(), "Optimistic patch applied");
        Ok(PendingMutation {
            key: key.clone(),
            kind,
            snapshot,
            started: Instant::now(),
        })
    }

    /// Settles a pending mutation with the remote call's outcome.
    ///
    /// On success `reconcile` may rewrite the current collection from the
    /// server's answer (returning `None` keeps the optimistic state). On
    /// failure the snapshot is restored and the failure is returned as
    /// [`Error::RemoteWrite`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::RemoteWrite`] if `outcome` is an error.
    pub fn settle<T, R, C>(
        &self,
        pending: PendingMutation<T>,
        outcome: Result<R>,
        reconcile: C,
    ) -> Result<R>
    where
        T: Record,
        C: FnOnce(&R, &[Arc<T>]) -> Option<Vec<Arc<T>>>,
    {
        let PendingMutation {
            key,
            kind,
            snapshot,
            started,
        } = pending;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        metrics::histogram!("cache_mutation_duration_ms", "kind" => kind.as_str())
            .record(elapsed_ms);

        match outcome {
            Ok(value) => {
                let reconciled = self
                    .store
                    .update_with(&key, CacheChange::Patched, |current: &Collection<T>| {
                        Ok(reconcile(&value, current))
                    });
                if let Err(e) = reconciled {
                    // The write reached the server; the optimistic view stands.
                    tracing::error!(%key, kind = kind.as_str(), "Failed to reconcile: {e}");
                }
                record_outcome(&key, kind, "success");
                tracing::debug!(%key, kind = kind.as_str(), elapsed_ms, "Mutation confirmed");
                Ok(value)
            },
            Err(source) => {
                match snapshot {
                    Some(snapshot) => {
                        if let Err(e) =
                            self.store.replace_as(&key, snapshot, CacheChange::RolledBack)
                        {
                            tracing::error!(%key, kind = kind.as_str(), "Failed to restore snapshot: {e}");
                        }
                    },
                    // Nothing was cached before the patch; leave nothing behind.
                    None => {
                        self.store.evict_as(&key, CacheChange::RolledBack);
                    },
                }
                record_outcome(&key, kind, "rolled_back");
                metrics::counter!(
                    "cache_rollbacks_total",
                    "resource" => key.resource.as_str(),
                    "kind" => kind.as_str()
                )
                .increment(1);
                tracing::warn!(%key, kind = kind.as_str(), "Remote write failed, rolled back: {source}");
                Err(Error::RemoteWrite {
                    kind,
                    source: Box::new(source),
                })
            },
        }
    }

    /// Runs one optimistic mutation end to end.
    ///
    /// Captures the snapshot, applies `optimistic`, invokes `remote`, then
    /// settles with `reconcile` or rolls back.
    ///
    /// # Errors
    ///
    /// Returns the error from `optimistic` (nothing was changed) or
    /// [`Error::RemoteWrite`] (the change was rolled back).
    pub fn mutate<T, R, P, F, C>(
        &self,
        key: &CollectionKey,
        kind: MutationKind,
        optimistic: P,
        remote: F,
        reconcile: C,
    ) -> Result<R>
    where
        T: Record,
        P: FnOnce(&[Arc<T>]) -> Result<Vec<Arc<T>>>,
        F: FnOnce() -> Result<R>,
        C: FnOnce(&R, &[Arc<T>]) -> Option<Vec<Arc<T>>>,
    {
        let pending = self.begin(key, kind, optimistic)?;
        let outcome = remote();
        self.settle(pending, outcome, reconcile)
    }

    /// Runs a server-first write: nothing changes until the server answers.
    ///
    /// There is no snapshot to restore, so a failure is returned as is.
    ///
    /// # Errors
    ///
    /// Returns the error from `remote`.
    pub fn confirm<T, R, F, C>(
        &self,
        key: &CollectionKey,
        kind: MutationKind,
        remote: F,
        reconcile: C,
    ) -> Result<R>
    where
        T: Record,
        F: FnOnce() -> Result<R>,
        C: FnOnce(&R, &[Arc<T>]) -> Option<Vec<Arc<T>>>,
    {
        let value = match remote() {
            Ok(value) => value,
            Err(e) => {
                record_outcome(key, kind, "error");
                return Err(e);
            },
        };
        self.store
            .update_with(key, kind.change(), |current: &Collection<T>| {
                Ok(reconcile(&value, current))
            })?;
        record_outcome(key, kind, "success");
        Ok(value)
    }
}

fn record_outcome(key: &CollectionKey, kind: MutationKind, status: &'static str) {
    metrics::counter!(
        "cache_mutations_total",
        "resource" => key.resource.as_str(),
        "kind" => kind.as_str(),
        "status" => status
    )
    .increment(1);
}
