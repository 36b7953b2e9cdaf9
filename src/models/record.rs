//! Record traits the cache and hooks are generic over.

use super::{RecordId, ResourceKind};
use crate::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;

/// A server-owned record held in the cache.
///
/// The cache only interprets the identifier; everything else is opaque.
pub trait Record:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// The resource this record type belongs to.
    const KIND: ResourceKind;

    /// Unique identifier within a collection.
    fn id(&self) -> &RecordId;
}

/// A record that lives in a user-ordered collection and can be created.
pub trait OrderedRecord: Record {
    /// Payload sent to create a new record.
    type Draft: Draft;

    /// Zero-based display position.
    fn sort_order(&self) -> u32;

    /// Sets the display position.
    fn set_sort_order(&mut self, sort_order: u32);

    /// Builds the placeholder shown while a create is in flight.
    fn provisional(draft: &Self::Draft, sort_order: u32) -> Self;
}

/// A create payload.
pub trait Draft: Serialize + Clone + fmt::Debug + Send + Sync {
    /// Checks that required fields are present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first missing field.
    fn validate(&self) -> Result<()>;

    /// Builds the JSON body for `POST /{resource}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the draft does not serialize to a JSON object.
    fn create_body(&self, sort_order: u32) -> Result<Value> {
        let mut body = serde_json::to_value(self).map_err(|e| Error::OperationFailed {
            operation: "encode_draft".to_string(),
            cause: e.to_string(),
        })?;
        let Some(fields) = body.as_object_mut() else {
            return Err(Error::Validation("draft must be a JSON object".to_string()));
        };
        fields.insert("sort_order".to_string(), Value::from(sort_order));
        Ok(body)
    }
}

/// Returns an error if `value` is blank.
pub(crate) fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{field} is required")));
    }
    Ok(())
}

/// Decodes one record from a server payload.
///
/// # Errors
///
/// Returns [`Error::Decode`] if the payload does not match the schema.
pub fn decode_record<T: Record>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::Decode {
        resource: T::KIND.as_str(),
        cause: e.to_string(),
    })
}

/// Decodes a list payload.
///
/// Arrays decode element-wise, a single object becomes a one-element list and
/// `null` is an empty list.
///
/// # Errors
///
/// Returns [`Error::Decode`] if any element does not match the schema.
pub fn decode_records<T: Record>(value: Value) -> Result<Vec<T>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items.into_iter().map(decode_record).collect(),
        other @ Value::Object(_) => Ok(vec![decode_record(other)?]),
        other => Err(Error::Decode {
            resource: T::KIND.as_str(),
            cause: format!("expected array or object, got {other}"),
        }),
    }
}

/// Merges `partial` over the fields of `record`.
///
/// The `_id` key is ignored: identifiers are server-owned.
///
/// # Errors
///
/// Returns [`Error::Decode`] if the merged fields no longer fit the schema.
pub fn merge_fields<T: Record>(record: &T, partial: &Map<String, Value>) -> Result<T> {
    let mut value = serde_json::to_value(record).map_err(|e| Error::Decode {
        resource: T::KIND.as_str(),
        cause: e.to_string(),
    })?;
    if let Some(fields) = value.as_object_mut() {
        for (key, field) in partial {
            if key != "_id" {
                fields.insert(key.clone(), field.clone());
            }
        }
    }
    decode_record(value)
}
