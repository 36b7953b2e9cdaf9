//! Data models for reachme.
//!
//! Identifiers, collection keys, the record traits the cache is generic over,
//! and the three concrete resources of the editor.

mod asset;
mod keys;
mod link;
mod product;
mod profile;
mod public;
mod record;

pub use asset::Asset;
pub use keys::{CollectionKey, OwnerId, RecordId, ResourceKind};
pub use link::{Link, LinkDraft};
pub use product::{Product, ProductDraft};
pub use profile::Profile;
pub use public::PublicPage;
pub use record::{Draft, OrderedRecord, Record, decode_record, decode_records, merge_fields};
