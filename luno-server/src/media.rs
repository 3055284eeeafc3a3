//! Storage for uploaded media files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use uuid::Uuid;

use luno_types::MediaType;

/// URL prefix under which stored files are served
pub const UPLOADS_ROUTE: &str = "/uploads";

/// An uploaded file after it has been stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMedia {
    /// Opaque, URL-like reference to the stored bytes
    pub media_ref: String,
    pub media_type: MediaType,
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn store(
        &self,
        bytes: &[u8],
        content_type: Option<&str>,
        file_name: Option<&str>,
    ) -> Result<StoredMedia>;
}

/// Writes uploads into a directory under random names, keeping the extension.
pub struct DiskMediaStore {
    root: PathBuf,
}

impl DiskMediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

/// Lower-cased extension of the client's file name, with the leading dot
fn extension_of(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}

#[async_trait]
impl MediaStore for DiskMediaStore {
    async fn store(
        &self,
        bytes: &[u8],
        content_type: Option<&str>,
        file_name: Option<&str>,
    ) -> Result<StoredMedia> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("Failed to create upload directory {}", self.root.display()))?;

        let stored_name = format!("{}{}", Uuid::new_v4(), extension_of(file_name));
        let path = self.root.join(&stored_name);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write upload {}", path.display()))?;

        tracing::debug!(file = %stored_name, size = bytes.len(), "Stored upload");

        Ok(StoredMedia {
            media_ref: format!("{UPLOADS_ROUTE}/{stored_name}"),
            media_type: MediaType::from_content_type(content_type),
        })
    }
}
