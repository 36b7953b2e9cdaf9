//! Cache store: the last-known collections per resource and owner.

use super::{CacheChange, CacheEvent};
use crate::models::{CollectionKey, Record, RecordId};
use crate::observability::EventBus;
use crate::{Error, Result};
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, RwLock};

/// An immutable view of a cached collection.
///
/// Records that a change does not touch keep their `Arc`, so views can detect
/// change per record with [`Arc::ptr_eq`].
pub type Collection<T> = Arc<Vec<Arc<T>>>;

/// A type-erased `Collection<T>`.
type Entry = Arc<dyn Any + Send + Sync>;

fn empty<T>() -> Collection<T> {
    Arc::new(Vec::new())
}

/// Holds every cached collection for one editing session.
///
/// Collections for different keys never share storage: writing to
/// `(links, A)` cannot change `(links, B)` or `(products, A)`.
pub struct CacheStore {
    collections: RwLock<HashMap<CollectionKey, Entry>>,
    events: EventBus,
}

impl CacheStore {
    /// Creates an empty store with its own event bus.
    #[must_use]
    pub fn new() -> Self {
        Self::with_event_bus(EventBus::default())
    }

    /// Creates an empty store that publishes to `events`.
    #[must_use]
    pub fn with_event_bus(events: EventBus) -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            events,
        }
    }

    /// The bus every committed change is published on.
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    /// Returns the current collection, or an empty one if nothing is cached.
    pub fn get<T: Record>(&self, key: &CollectionKey) -> Collection<T> {
        let Ok(guard) = self.collections.read() else {
            tracing::warn!(%key, "Cache lock poisoned, reading as empty");
            return empty();
        };
        guard
            .get(key)
            .map_or_else(empty, |entry| downcast::<T>(key, entry))
    }

    /// Whether a collection is cached under `key` (possibly empty).
    pub fn contains_key(&self, key: &CollectionKey) -> bool {
        self.collections
            .read()
            .map(|guard| guard.contains_key(key))
            .unwrap_or(false)
    }

    /// Returns the cached record with `id`, if any.
    pub fn find<T: Record>(&self, key: &CollectionKey, id: &RecordId) -> Option<Arc<T>> {
        self.get::<T>(key)
            .iter()
            .find(|record| record.id() == id)
            .cloned()
    }

    /// Whether a record with `id` is cached under `key`.
    pub fn contains<T: Record>(&self, key: &CollectionKey, id: &RecordId) -> bool {
        self.find::<T>(key, id).is_some()
    }

    /// Overwrites the collection at `key`.
    ///
    /// The collection is stored as given (same `Arc`) unless it holds duplicate
    /// ids, in which case later duplicates are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache lock is poisoned.
    pub fn replace<T: Record>(&self, key: &CollectionKey, records: Collection<T>) -> Result<()> {
        self.replace_as(key, records, CacheChange::Replaced)
    }

    /// Overwrites the collection at `key` with freshly fetched records.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache lock is poisoned.
    pub fn replace_records<T: Record>(
        &self,
        key: &CollectionKey,
        records: Vec<T>,
    ) -> Result<Collection<T>> {
        let collection: Collection<T> = Arc::new(records.into_iter().map(Arc::new).collect());
        self.replace(key, Arc::clone(&collection))?;
        Ok(self.get(key))
    }

    pub(super) fn replace_as<T: Record>(
        &self,
        key: &CollectionKey,
        records: Collection<T>,
        change: CacheChange,
    ) -> Result<()> {
        let records = if has_duplicate_ids(&records) {
            tracing::warn!(%key, "Dropping records with duplicate ids");
            Arc::new(unique_by_id(records.iter().cloned().collect()))
        } else {
            records
        };
        let len = records.len();
        {
            let mut guard = self.write_guard()?;
            let entry: Entry = records;
            guard.insert(key.clone(), entry);
        }
        self.published(key, change, len);
        Ok(())
    }

    /// Computes a patched collection without committing it.
    ///
    /// Every record matching `predicate` is replaced by `updater(record)`;
    /// other records keep their `Arc`. The caller decides whether to commit
    /// the result with [`CacheStore::replace`].
    pub fn patch<T, P, U>(&self, key: &CollectionKey, predicate: P, updater: U) -> Collection<T>
    where
        T: Record,
        P: Fn(&T) -> bool,
        U: FnMut(&T) -> T,
    {
        Arc::new(patched(&self.get(key), predicate, updater))
    }

    /// Adds a record to the end of the collection.
    ///
    /// If a record with the same id is already cached it is replaced in place
    /// instead, keeping ids unique.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache lock is poisoned.
    pub fn append<T: Record>(&self, key: &CollectionKey, record: T) -> Result<Collection<T>> {
        let record = Arc::new(record);
        let (_, current) = self.update_with(key, CacheChange::Appended, |records| {
            Ok(Some(upsert(records, record)))
        })?;
        Ok(current)
    }

    /// Removes every record matching `predicate`; returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache lock is poisoned.
    pub fn remove<T, P>(&self, key: &CollectionKey, predicate: P) -> Result<usize>
    where
        T: Record,
        P: Fn(&T) -> bool,
    {
        let (before, after) = self.update_with(key, CacheChange::Removed, |records: &Collection<T>| {
            if records.iter().any(|record| predicate(record)) {
                Ok(Some(without(records, &predicate)))
            } else {
                Ok(None)
            }
        })?;
        Ok(before.len().saturating_sub(after.len()))
    }

    /// Atomically reads and rewrites one collection.
    ///
    /// `f` sees the current collection under the write lock. Returning
    /// `Ok(None)` leaves it untouched; returning an error aborts without
    /// change. Yields `(previous, current)`.
    ///
    /// # Errors
    ///
    /// Returns the error from `f`, or an error if the cache lock is poisoned.
    pub fn update_with<T, F>(
        &self,
        key: &CollectionKey,
        change: CacheChange,
        f: F,
    ) -> Result<(Collection<T>, Collection<T>)>
    where
        T: Record,
        F: FnOnce(&Collection<T>) -> Result<Option<Vec<Arc<T>>>>,
    {
        let (previous, current) = self.update_entry(key, change, f)?;
        Ok((previous.unwrap_or_else(empty), current))
    }

    /// Like [`CacheStore::update_with`], but the previous collection is
    /// `None` when nothing was cached under `key`.
    pub(super) fn update_entry<T, F>(
        &self,
        key: &CollectionKey,
        change: CacheChange,
        f: F,
    ) -> Result<(Option<Collection<T>>, Collection<T>)>
    where
        T: Record,
        F: FnOnce(&Collection<T>) -> Result<Option<Vec<Arc<T>>>>,
    {
        let (previous, current) = {
            let mut guard = self.write_guard()?;
            let previous = guard.get(key).map(|entry| downcast::<T>(key, entry));
            let seen = previous.clone().unwrap_or_else(empty);
            let Some(next) = f(&seen)? else {
                return Ok((previous, seen));
            };
            let current: Collection<T> = Arc::new(unique_by_id(next));
            let entry: Entry = current.clone();
            guard.insert(key.clone(), entry);
            (previous, current)
        };
        self.published(key, change, current.len());
        Ok((previous, current))
    }

    /// Drops the collection at `key`; returns whether one was cached.
    pub fn evict(&self, key: &CollectionKey) -> bool {
        self.evict_as(key, CacheChange::Evicted)
    }

    pub(super) fn evict_as(&self, key: &CollectionKey, change: CacheChange) -> bool {
        let removed = self
            .collections
            .write()
            .map(|mut guard| guard.remove(key).is_some())
            .unwrap_or(false);
        if removed {
            self.published(key, change, 0);
        }
        removed
    }

    /// Drops every cached collection.
    pub fn clear(&self) {
        for key in self.keys() {
            self.evict(&key);
        }
    }

    /// Returns the keys of all cached collections.
    pub fn keys(&self) -> Vec<CollectionKey> {
        self.collections
            .read()
            .map(|guard| guard.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn write_guard(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<CollectionKey, Entry>>> {
        self.collections.write().map_err(|_| Error::OperationFailed {
            operation: "cache_write".to_string(),
            cause: "cache lock poisoned".to_string(),
        })
    }

    fn published(&self, key: &CollectionKey, change: CacheChange, len: usize) {
        tracing::debug!(%key, change = change.as_str(), len, "Cache commit");
        metrics::counter!(
            "cache_commits_total",
            "resource" => key.resource.as_str(),
            "change" => change.as_str()
        )
        .increment(1);
        self.events.publish(CacheEvent {
            key: key.clone(),
            change,
            len,
        });
    }
}

impl fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("collections", &self.keys().len())
            .field("subscribers", &self.events.receiver_count())
            .finish_non_exhaustive()
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}

fn downcast<T: Record>(key: &CollectionKey, entry: &Entry) -> Collection<T> {
    Arc::clone(entry)
        .downcast::<Vec<Arc<T>>>()
        .unwrap_or_else(|_| {
            tracing::warn!(%key, "Cached collection holds a different record type");
            empty()
        })
}

/// Replaces every record matching `predicate` with `updater(record)`.
pub(crate) fn patched<T, P, U>(records: &[Arc<T>], predicate: P, mut updater: U) -> Vec<Arc<T>>
where
    P: Fn(&T) -> bool,
    U: FnMut(&T) -> T,
{
    records
        .iter()
        .map(|record| {
            if predicate(record) {
                Arc::new(updater(record))
            } else {
                Arc::clone(record)
            }
        })
        .collect()
}

/// Returns the records not matching `predicate`.
pub(crate) fn without<T, P>(records: &[Arc<T>], predicate: P) -> Vec<Arc<T>>
where
    P: Fn(&T) -> bool,
{
    records
        .iter()
        .filter(|record| !predicate(record))
        .cloned()
        .collect()
}

/// Appends `record`, or replaces the cached record with the same id in place.
pub(crate) fn upsert<T: Record>(records: &[Arc<T>], record: Arc<T>) -> Vec<Arc<T>> {
    let mut next = records.to_vec();
    match next.iter().position(|existing| existing.id() == record.id()) {
        Some(index) => next[index] = record,
        None => next.push(record),
    }
    next
}

fn has_duplicate_ids<T: Record>(records: &[Arc<T>]) -> bool {
    let mut seen = HashSet::with_capacity(records.len());
    records.iter().any(|record| !seen.insert(record.id()))
}

fn unique_by_id<T: Record>(records: Vec<Arc<T>>) -> Vec<Arc<T>> {
    if !has_duplicate_ids(&records) {
        return records;
    }
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|record| seen.insert(record.id().clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Link, Product, ResourceKind};

    fn link(id: &str, sort_order: u32) -> Link {
        serde_json::from_value(serde_json::json!({
            "_id": id,
            "title": format!("link {id}"),
            "sort_order": sort_order
        }))
        .unwrap()
    }

    fn links_key(owner: &str) -> CollectionKey {
        CollectionKey::new(ResourceKind::Links, owner)
    }

    fn ids(records: &Collection<Link>) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_get_missing_is_empty() {
        let store = CacheStore::new();
        assert!(store.get::<Link>(&links_key("a")).is_empty());
        assert!(!store.contains_key(&links_key("a")));
    }

    #[test]
    fn test_debug_reports_collection_count() {
        let store = CacheStore::new();
        store.replace_records(&links_key("a"), vec![link("1", 0)]).unwrap();
        let debug = format!("{store:?}");
        assert!(debug.starts_with("CacheStore"));
        assert!(debug.contains("collections: 1"));
    }

    #[test]
    fn test_replace_then_get() {
        let store = CacheStore::new();
        let key = links_key("a");
        store
            .replace_records(&key, vec![link("1", 0), link("2", 1)])
            .unwrap();
        assert_eq!(ids(&store.get(&key)), vec!["1", "2"]);
        assert!(store.contains::<Link>(&key, &RecordId::new("2")));
    }

    #[test]
    fn test_patch_keeps_untouched_references_and_does_not_commit() {
        let store = CacheStore::new();
        let key = links_key("a");
        let before = store
            .replace_records(&key, vec![link("1", 0), link("2", 1)])
            .unwrap();

        let target = RecordId::new("2");
        let after = store.patch(
            &key,
            |r: &Link| r.id == target,
            |r| Link {
                title: "renamed".to_string(),
                ..r.clone()
            },
        );

        assert!(Arc::ptr_eq(&before[0], &after[0]));
        assert!(!Arc::ptr_eq(&before[1], &after[1]));
        assert_eq!(after[1].title, "renamed");
        assert_eq!(store.get::<Link>(&key)[1].title, "link 2");
    }

    #[test]
    fn test_append_and_remove() {
        let store = CacheStore::new();
        let key = links_key("a");
        store.append(&key, link("1", 0)).unwrap();
        store.append(&key, link("2", 1)).unwrap();
        assert_eq!(ids(&store.get(&key)), vec!["1", "2"]);

        let removed = store.remove(&key, |r: &Link| r.id.as_str() == "1").unwrap();
        assert_eq!(removed, 1);
        assert_eq!(ids(&store.get(&key)), vec!["2"]);

        let removed = store.remove(&key, |r: &Link| r.id.as_str() == "9").unwrap();
        assert_eq!(removed, 0);
    }

    #[test]
    fn test_append_existing_id_replaces_in_place() {
        let store = CacheStore::new();
        let key = links_key("a");
        store
            .replace_records(&key, vec![link("1", 0), link("2", 1)])
            .unwrap();
        let mut updated = link("1", 0);
        updated.title = "fresh".to_string();
        let current = store.append(&key, updated).unwrap();
        assert_eq!(ids(&current), vec!["1", "2"]);
        assert_eq!(current[0].title, "fresh");
    }

    #[test]
    fn test_replace_drops_duplicate_ids() {
        let store = CacheStore::new();
        let key = links_key("a");
        let current = store
            .replace_records(&key, vec![link("1", 0), link("1", 1), link("2", 2)])
            .unwrap();
        assert_eq!(ids(&current), vec!["1", "2"]);
        assert_eq!(current[0].sort_order, 0);
    }

    #[test]
    fn test_replace_keeps_collection_identity() {
        let store = CacheStore::new();
        let key = links_key("a");
        let snapshot: Collection<Link> = Arc::new(vec![Arc::new(link("1", 0))]);
        store.replace(&key, Arc::clone(&snapshot)).unwrap();
        assert!(Arc::ptr_eq(&snapshot, &store.get(&key)));
    }

    #[test]
    fn test_keys_are_isolated() {
        let store = CacheStore::new();
        let a = links_key("a");
        let b = links_key("b");
        let products_a = CollectionKey::new(ResourceKind::Products, "a");
        store.replace_records(&b, vec![link("1", 0)]).unwrap();
        store.replace_records::<Product>(&products_a, Vec::new()).unwrap();

        store.append(&a, link("1", 0)).unwrap();
        store.remove(&a, |_: &Link| true).unwrap();

        assert_eq!(ids(&store.get(&b)), vec!["1"]);
        assert!(store.get::<Product>(&products_a).is_empty());
        assert!(store.contains_key(&products_a));
    }

    #[test]
    fn test_update_with_error_leaves_collection_unchanged() {
        let store = CacheStore::new();
        let key = links_key("a");
        store.replace_records(&key, vec![link("1", 0)]).unwrap();
        let result = store.update_with(&key, CacheChange::Replaced, |_: &Collection<Link>| {
            Err(Error::Validation("nope".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(ids(&store.get(&key)), vec!["1"]);
    }

    #[test]
    fn test_wrong_record_type_reads_as_empty() {
        let store = CacheStore::new();
        let key = links_key("a");
        store.replace_records(&key, vec![link("1", 0)]).unwrap();
        assert!(store.get::<Product>(&key).is_empty());
    }

    #[test]
    fn test_commits_are_published() {
        let store = CacheStore::new();
        let key = links_key("a");
        let mut receiver = store.events().subscribe_key(key.clone());
        store.append(&key, link("1", 0)).unwrap();
        store.evict(&key);

        let first = receiver.try_recv().unwrap();
        assert_eq!(first.change, CacheChange::Appended);
        assert_eq!(first.len, 1);
        assert_eq!(receiver.try_recv().unwrap().change, CacheChange::Evicted);
    }

    #[test]
    fn test_clear_evicts_everything() {
        let store = CacheStore::new();
        store.append(&links_key("a"), link("1", 0)).unwrap();
        store.append(&links_key("b"), link("2", 0)).unwrap();
        store.clear();
        assert!(store.keys().is_empty());
    }
}
