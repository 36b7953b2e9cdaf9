//! REST collaborators.
//!
//! The cache talks to the API through [`RemoteClient`] and hands image uploads
//! to an [`AssetUploader`]. [`HttpClient`] implements both with `reqwest`.
//!
//! # Contract
//!
//! | Call | Answer |
//! |------|--------|
//! | `GET /{resource}` | records of the signed-in owner |
//! | `POST /{resource}` | created record with server `_id` |
//! | `PUT /{resource}/{id}` | updated record or 204 |
//! | `DELETE /{resource}/{id}` | 204 |
//! | `PUT /{resource}/reorder` with `{updates: [{id, sort_order}]}` | 204 |
//! | `POST /upload` (multipart `image`) | `{url}` |

mod http;

pub use http::HttpClient;

use crate::Result;
use crate::models::Asset;
use serde_json::Value;

/// Trait for the REST API the cache mirrors.
///
/// Paths are relative to the API base URL and start with `/`. Credentials are
/// the implementation's concern.
pub trait RemoteClient: Send + Sync {
    /// The client name, for logs.
    fn name(&self) -> &'static str;

    /// Fetches a resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the status is not 2xx.
    fn get(&self, path: &str) -> Result<Value>;

    /// Creates a resource; `None` when the server answers without a body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the status is not 2xx.
    fn post(&self, path: &str, body: &Value) -> Result<Option<Value>>;

    /// Updates a resource; `None` when the server answers without a body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the status is not 2xx.
    fn put(&self, path: &str, body: &Value) -> Result<Option<Value>>;

    /// Deletes a resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the status is not 2xx.
    fn delete(&self, path: &str) -> Result<()>;
}

/// Trait for the image upload service.
pub trait AssetUploader: Send + Sync {
    /// Uploads an image and returns its public URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload fails.
    fn upload(&self, asset: &Asset) -> Result<String>;
}
