use crate::errors::ApiError;
use crate::validation::{allowed_extension, mime_for_extension, sanitize_filename};
use crate::Result;
use sha2::{Digest, Sha256};
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// File written to storage, with the digest computed while saving
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub storage_key: String,
    pub original_name: String,
    pub mime_type: Option<String>,
    pub sha256: String,
    pub size: u64,
}

/// Local disk storage for uploaded documents
///
/// Files live under `<root>/<user_id>/<uuid>_<sanitized name>`; the relative
/// part is the storage key persisted on the document row.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
    max_bytes: usize,
}

/// Hex encoded SHA-256 digest of `data`
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

impl Storage {
    pub fn new(root: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            root: root.into(),
            max_bytes,
        }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Validates and writes an upload owned by `user_id`
    pub async fn save(
        &self,
        user_id: &str,
        original_name: &str,
        content_type: Option<&str>,
        data: &[u8],
    ) -> Result<StoredFile> {
        if data.is_empty() {
            return Err(ApiError::BadRequest("Uploaded file is empty".to_string()));
        }
        if data.len() > self.max_bytes {
            return Err(ApiError::PayloadTooLarge(format!(
                "File exceeds the maximum size of {} bytes",
                self.max_bytes
            )));
        }

        let ext = allowed_extension(original_name).ok_or_else(|| {
            ApiError::BadRequest("File type not allowed. Allowed types: pdf, png, jpg, jpeg".into())
        })?;

        let sanitized = sanitize_filename(original_name);
        let storage_key = format!(
            "{}/{}_{}",
            sanitize_filename(user_id),
            uuid::Uuid::new_v4(),
            sanitized
        );
        let path = self.resolve(&storage_key)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, data).await?;

        tracing::info!("Stored {} bytes at {}", data.len(), storage_key);

        let mime_type = content_type
            .filter(|ct| !ct.is_empty() && *ct != "application/octet-stream")
            .map(str::to_string)
            .or_else(|| mime_for_extension(&ext).map(str::to_string));

        Ok(StoredFile {
            storage_key,
            original_name: sanitized,
            mime_type,
            sha256: sha256_hex(data),
            size: data.len() as u64,
        })
    }

    pub async fn read(&self, storage_key: &str) -> Result<Vec<u8>> {
        let path = self.resolve(storage_key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ApiError::NotFound(
                "Stored file not found".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes a stored file; a file that is already gone is not an error
    pub async fn delete(&self, storage_key: &str) -> Result<()> {
        let path = self.resolve(storage_key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Stored file {} already missing", storage_key);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Maps a storage key to a path under the root, refusing keys that escape it
    fn resolve(&self, storage_key: &str) -> Result<PathBuf> {
        let key = Path::new(storage_key);
        let is_safe = !storage_key.is_empty()
            && key
                .components()
                .all(|component| matches!(component, Component::Normal(_)));

        if !is_safe {
            tracing::warn!("Rejected unsafe storage key: {}", storage_key);
            return Err(ApiError::BadRequest("Invalid storage key".to_string()));
        }
        Ok(self.root.join(key))
    }
}
