//! Typed, owner-bound access to one cached resource collection.
//!
//! A [`ResourceHook`] is what the editor talks to: it binds a
//! [`CollectionKey`] to the signed-in owner and turns add/update/remove/reorder
//! into optimistic mutations through the [`MutationCoordinator`].

use crate::cache::{CacheStore, Collection, MutationCoordinator, MutationKind};
use crate::models::{
    Asset, CollectionKey, Draft, Link, OrderedRecord, OwnerId, Profile, Record, RecordId,
    decode_record, decode_records, merge_fields,
};
use crate::remote::{AssetUploader, RemoteClient};
use crate::{Error, Result};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::instrument;

/// Cached collection of one resource for one owner.
pub struct ResourceHook<T: Record> {
    key: CollectionKey,
    coordinator: MutationCoordinator,
    client: Arc<dyn RemoteClient>,
    uploader: Option<Arc<dyn AssetUploader>>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> Clone for ResourceHook<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            coordinator: self.coordinator.clone(),
            client: Arc::clone(&self.client),
            uploader: self.uploader.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: Record> fmt::Debug for ResourceHook<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHook")
            .field("key", &self.key)
            .field("client", &self.client.name())
            .field("uploader", &self.uploader.is_some())
            .finish_non_exhaustive()
    }
}

impl<T: Record> ResourceHook<T> {
    /// Creates a hook for `owner`'s collection of `T` in `store`.
    #[must_use]
    pub fn new(
        owner: impl Into<OwnerId>,
        store: Arc<CacheStore>,
        client: Arc<dyn RemoteClient>,
    ) -> Self {
        Self {
            key: CollectionKey::new(T::KIND, owner),
            coordinator: MutationCoordinator::new(store),
            client,
            uploader: None,
            _record: PhantomData,
        }
    }

    /// Sets the image upload service used by [`ResourceHook::upload_asset`].
    #[must_use]
    pub fn with_uploader(mut self, uploader: Arc<dyn AssetUploader>) -> Self {
        self.uploader = Some(uploader);
        self
    }

    /// The collection this hook reads and writes.
    #[must_use]
    pub const fn key(&self) -> &CollectionKey {
        &self.key
    }

    /// The shared store.
    #[must_use]
    pub const fn store(&self) -> &Arc<CacheStore> {
        self.coordinator.store()
    }

    /// The current (possibly optimistic) collection.
    #[must_use]
    pub fn records(&self) -> Collection<T> {
        self.store().get(&self.key)
    }

    /// The cached record with `id`, if any.
    #[must_use]
    pub fn get(&self, id: &RecordId) -> Option<Arc<T>> {
        self.store().find(&self.key, id)
    }

    /// Whether the collection has been fetched at least once.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.store().contains_key(&self.key)
    }

    /// Fetches the collection from the server and replaces the cache with it.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the payload does not decode.
    #[instrument(skip(self), fields(operation = "hook.load", resource = T::KIND.as_str()))]
    pub fn load(&self) -> Result<Collection<T>> {
        let payload = self.client.get(T::KIND.collection_path())?;
        let records = decode_records::<T>(payload)?;
        tracing::debug!(count = records.len(), "Collection fetched");
        self.store().replace_records(&self.key, records)
    }

    /// Merges `partial` into the record with `id`, optimistically.
    ///
    /// Returns `Ok(None)` without contacting the server when `id` is not
    /// cached. Otherwise the merged record is visible immediately and replaced
    /// by the server's answer when it sends one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `partial` is not a JSON object or `id`
    /// belongs to a record still being created, and [`Error::RemoteWrite`] if
    /// the server rejects the update (the record is rolled back).
    #[instrument(skip(self, partial), fields(operation = "hook.update", resource = T::KIND.as_str()))]
    pub fn update(&self, id: &RecordId, partial: Value) -> Result<Option<Arc<T>>> {
        let Value::Object(fields) = partial else {
            return Err(Error::Validation("update must be a JSON object".to_string()));
        };
        reject_provisional(id)?;
        if self.get(id).is_none() {
            tracing::debug!(%id, "Record not cached, skipping update");
            return Ok(None);
        }

        // Merged under the store lock; concurrent updates of other fields survive.
        let mut cached = true;
        let pending = self
            .coordinator
            .begin(&self.key, MutationKind::Update, |records: &[Arc<T>]| {
                let Some(current) = records.iter().find(|record| record.id() == id) else {
                    cached = false;
                    return Ok(records.to_vec());
                };
                let merged = Arc::new(merge_fields(current.as_ref(), &fields)?);
                Ok(with_record(records, id, &merged))
            })?;
        if !cached {
            tracing::debug!(%id, "Record removed before update, skipping");
            self.coordinator
                .settle(pending, Ok(()), |_: &(), _: &[Arc<T>]| None)?;
            return Ok(None);
        }

        let path = T::KIND.item_path(id);
        let outcome = self.client.put(&path, &Value::Object(fields));
        self.coordinator
            .settle(pending, outcome, |answer: &Option<Value>, records: &[Arc<T>]| {
                let confirmed = server_record::<T>(answer.as_ref()?, id)?;
                Some(with_record(records, id, &Arc::new(confirmed)))
            })?;
        Ok(self.get(id))
    }

    /// Uploads `asset` and stores its URL in `field` of the record with `id`.
    ///
    /// Returns the uploaded URL.
    ///
    /// # Errors
    ///
    /// Returns an error if no uploader is configured, the upload fails, or
    /// the follow-up update fails.
    #[instrument(skip(self, asset), fields(operation = "hook.upload_asset", resource = T::KIND.as_str(), size = asset.bytes.len()))]
    pub fn upload_asset(&self, id: &RecordId, field: &str, asset: &Asset) -> Result<String> {
        if field.trim().is_empty() {
            return Err(Error::Validation("field is required".to_string()));
        }
        let uploader = self.uploader.as_ref().ok_or_else(|| Error::OperationFailed {
            operation: "upload_asset".to_string(),
            cause: "no asset uploader configured".to_string(),
        })?;

        let url = uploader.upload(asset)?;
        let mut partial = Map::new();
        partial.insert(field.to_string(), Value::String(url.clone()));
        if self.update(id, Value::Object(partial))?.is_none() {
            tracing::warn!(%id, field, "Uploaded asset for a record that is not cached");
        }
        Ok(url)
    }
}

impl<T: OrderedRecord> ResourceHook<T> {
    /// Creates a record at the end of the collection.
    ///
    /// A placeholder with a provisional id is visible while the request is in
    /// flight and is replaced by the record the server returns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] before any request if the draft misses
    /// required fields, and [`Error::RemoteWrite`] if the create fails (the
    /// placeholder is removed).
    #[instrument(skip(self, draft), fields(operation = "hook.add", resource = T::KIND.as_str()))]
    pub fn add(&self, draft: T::Draft) -> Result<Arc<T>> {
        draft.validate()?;

        let mut sort_order = 0;
        let mut placeholder_id = None;
        let pending = self
            .coordinator
            .begin(&self.key, MutationKind::Create, |records: &[Arc<T>]| {
                sort_order = u32::try_from(records.len()).unwrap_or(u32::MAX);
                let placeholder = T::provisional(&draft, sort_order);
                placeholder_id = Some(placeholder.id().clone());
                let mut next = records.to_vec();
                next.push(Arc::new(placeholder));
                Ok(next)
            })?;

        let outcome = draft
            .create_body(sort_order)
            .and_then(|body| self.client.post(T::KIND.collection_path(), &body))
            .and_then(|answer| {
                let value = answer.ok_or_else(|| Error::Decode {
                    resource: T::KIND.as_str(),
                    cause: "create returned no record".to_string(),
                })?;
                decode_record::<T>(value)
            })
            .map(Arc::new);

        self.coordinator
            .settle(pending, outcome, |created: &Arc<T>, records: &[Arc<T>]| {
                let mut next = records.to_vec();
                let slot = next
                    .iter()
                    .position(|record| Some(record.id()) == placeholder_id.as_ref());
                match slot {
                    Some(index) => next[index] = Arc::clone(created),
                    None => next.push(Arc::clone(created)),
                }
                Some(next)
            })
    }

    /// Deletes the record with `id`, optimistically.
    ///
    /// Returns `Ok(false)` without contacting the server when `id` is not
    /// cached.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RemoteWrite`] if the delete fails (the record is
    /// restored).
    #[instrument(skip(self), fields(operation = "hook.remove", resource = T::KIND.as_str()))]
    pub fn remove(&self, id: &RecordId) -> Result<bool> {
        reject_provisional(id)?;
        if self.get(id).is_none() {
            tracing::debug!(%id, "Record not cached, skipping delete");
            return Ok(false);
        }

        let path = T::KIND.item_path(id);
        self.coordinator.mutate(
            &self.key,
            MutationKind::Delete,
            |records: &[Arc<T>]| {
                Ok(records
                    .iter()
                    .filter(|record| record.id() != id)
                    .cloned()
                    .collect())
            },
            || self.client.delete(&path),
            |_: &(), _: &[Arc<T>]| None,
        )?;
        Ok(true)
    }

    /// Puts the collection in the order of `ids` and renumbers it `0..N-1`.
    ///
    /// `ids` must list every cached record exactly once. Records whose
    /// position does not change keep their `Arc`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `ids` is not a permutation of the
    /// cached ids, and [`Error::RemoteWrite`] if the server rejects the new
    /// order (the previous order is restored).
    #[instrument(skip(self, ids), fields(operation = "hook.reorder", resource = T::KIND.as_str(), count = ids.len()))]
    pub fn reorder(&self, ids: &[RecordId]) -> Result<Collection<T>> {
        let path = T::KIND.reorder_path().ok_or_else(|| {
            Error::Validation(format!("{} cannot be reordered", T::KIND.as_str()))
        })?;

        let mut updates: Vec<Value> = Vec::new();
        let pending = self
            .coordinator
            .begin(&self.key, MutationKind::Reorder, |records: &[Arc<T>]| {
                let next = reordered(records, ids)?;
                updates = next
                    .iter()
                    .map(|record| json!({"id": record.id(), "sort_order": record.sort_order()}))
                    .collect();
                Ok(next)
            })?;

        let body = json!({ "updates": updates });
        let outcome = self.client.put(path, &body);
        self.coordinator
            .settle(pending, outcome, |_: &Option<Value>, _: &[Arc<T>]| None)?;
        Ok(self.records())
    }

    /// Shows or hides the record with `id` on the public page.
    ///
    /// # Errors
    ///
    /// Same as [`ResourceHook::update`].
    pub fn set_active(&self, id: &RecordId, active: bool) -> Result<Option<Arc<T>>> {
        self.update(id, json!({ "is_active": active }))
    }
}

impl ResourceHook<Link> {
    /// Asks the server to refresh a dynamic (feed) link and merges the result.
    ///
    /// Not optimistic: the cache changes only after the server answers.
    /// Returns `Ok(None)` without contacting the server when `id` is not
    /// cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync request fails; the cache is untouched.
    #[instrument(skip(self), fields(operation = "links.sync_feed"))]
    pub fn sync_feed(&self, id: &RecordId) -> Result<Option<Arc<Link>>> {
        reject_provisional(id)?;
        if self.get(id).is_none() {
            return Ok(None);
        }

        let path = format!("{}/sync", Link::KIND.item_path(id));
        self.coordinator.confirm(
            &self.key,
            MutationKind::Sync,
            || self.client.post(&path, &json!({})),
            |answer: &Option<Value>, records: &[Arc<Link>]| {
                let fields = answer.as_ref()?.as_object()?;
                let current = records.iter().find(|record| &record.id == id)?;
                match merge_fields(current.as_ref(), fields) {
                    Ok(synced) => Some(with_record(records, id, &Arc::new(synced))),
                    Err(e) => {
                        tracing::warn!(%id, "Ignoring sync answer: {e}");
                        None
                    },
                }
            },
        )?;
        Ok(self.get(id))
    }
}

impl ResourceHook<Profile> {
    /// The signed-in creator's profile, if loaded.
    #[must_use]
    pub fn current(&self) -> Option<Arc<Profile>> {
        self.records().first().cloned()
    }

    /// Merges `partial` into the profile (`PUT /profiles/me`).
    ///
    /// # Errors
    ///
    /// Same as [`ResourceHook::update`].
    pub fn update_profile(&self, partial: Value) -> Result<Option<Arc<Profile>>> {
        let Some(current) = self.current() else {
            return Ok(None);
        };
        self.update(&current.id, partial)
    }

    /// Uploads a new avatar and stores its URL on the profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile is not loaded or the upload fails.
    pub fn upload_avatar(&self, asset: &Asset) -> Result<String> {
        let current = self.current().ok_or_else(|| Error::OperationFailed {
            operation: "upload_avatar".to_string(),
            cause: "profile not loaded".to_string(),
        })?;
        self.upload_asset(&current.id, "avatar_url", asset)
    }
}

fn reject_provisional(id: &RecordId) -> Result<()> {
    if id.is_provisional() {
        return Err(Error::Validation(format!("{id} is still being created")));
    }
    Ok(())
}

/// Swaps the record with `id` for `replacement`; other records keep their `Arc`.
fn with_record<T: Record>(records: &[Arc<T>], id: &RecordId, replacement: &Arc<T>) -> Vec<Arc<T>> {
    records
        .iter()
        .map(|record| {
            if record.id() == id {
                Arc::clone(replacement)
            } else {
                Arc::clone(record)
            }
        })
        .collect()
}

/// Decodes the server's answer to an update, if it is the record with `id`.
fn server_record<T: Record>(answer: &Value, id: &RecordId) -> Option<T> {
    match decode_record::<T>(answer.clone()) {
        Ok(record) if record.id() == id => Some(record),
        Ok(record) => {
            tracing::warn!(%id, answered = %record.id(), "Update answered with another record");
            None
        },
        Err(e) => {
            tracing::debug!(%id, "Keeping optimistic record: {e}");
            None
        },
    }
}

/// Orders `records` as `ids` and renumbers `sort_order` to positions.
fn reordered<T: OrderedRecord>(records: &[Arc<T>], ids: &[RecordId]) -> Result<Vec<Arc<T>>> {
    if ids.len() != records.len() {
        return Err(Error::Validation(format!(
            "reorder lists {} ids for {} records",
            ids.len(),
            records.len()
        )));
    }
    let mut by_id: HashMap<&RecordId, &Arc<T>> =
        records.iter().map(|record| (record.id(), record)).collect();

    ids.iter()
        .enumerate()
        .map(|(position, id)| {
            reject_provisional(id)?;
            let record = by_id.remove(id).ok_or_else(|| {
                Error::Validation(format!("{id} is unknown or listed twice"))
            })?;
            let sort_order = u32::try_from(position).unwrap_or(u32::MAX);
            if record.sort_order() == sort_order {
                return Ok(Arc::clone(record));
            }
            let mut moved = T::clone(record);
            moved.set_sort_order(sort_order);
            Ok(Arc::new(moved))
        })
        .collect()
}
