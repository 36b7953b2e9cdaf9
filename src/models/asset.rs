//! Files handed to the upload collaborator.

use crate::{Error, Result};
use std::path::Path;

/// An image to upload (thumbnail, product image, avatar).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// File name sent with the multipart part.
    pub file_name: String,
    /// MIME type.
    pub content_type: String,
    /// Raw bytes.
    pub bytes: Vec<u8>,
}

impl Asset {
    /// Creates an asset from bytes.
    #[must_use]
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Reads an image from disk, guessing the MIME type from the extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not an image type
    /// the API accepts.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        let content_type = content_type_for(&extension).ok_or_else(|| {
            Error::Validation(format!("unsupported image type: {}", path.display()))
        })?;
        let bytes = std::fs::read(path).map_err(|e| Error::OperationFailed {
            operation: "read_asset".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload")
            .to_string();
        Ok(Self::new(file_name, content_type, bytes))
    }
}

fn content_type_for(extension: &str) -> Option<&'static str> {
    match extension {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}
