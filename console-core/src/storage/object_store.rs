//! Object Storage
//!
//! `upload(path, bytes) -> url` and `delete(path)`. The filesystem backend
//! lays objects out under `images_dir/{path}` and serves them at
//! `{public_base_url}/{path}`.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use shared::error::{AppError, AppResult, ErrorCode};
use tokio::fs;

/// Maximum object size (5MB)
pub const MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` at `path` and return the public url
    async fn upload(&self, path: &str, bytes: &[u8]) -> AppResult<String>;

    /// Remove the object at `path`; `false` if nothing was there
    async fn delete(&self, path: &str) -> AppResult<bool>;

    /// Map a url previously returned by `upload` back to its path
    fn path_for_url(&self, url: &str) -> Option<String>;

    /// Remove the object behind a url; foreign urls are ignored
    async fn delete_url(&self, url: &str) -> AppResult<bool> {
        match self.path_for_url(url) {
            Some(path) => self.delete(&path).await,
            None => {
                tracing::debug!(url = %url, "Skipping delete of foreign url");
                Ok(false)
            }
        }
    }
}

/// Calculate SHA256 hash of data
pub fn content_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Storage path for an image: `{prefix}/{name}-{hash12}.{ext}`
pub fn image_path(prefix: &str, name: &str, bytes: &[u8], ext: &str) -> String {
    let hash = content_hash(bytes);
    format!("{}/{}-{}.{}", prefix.trim_matches('/'), name, &hash[..12], ext)
}

/// Reject empty, absolute and parent-escaping paths
fn validate_path(path: &str) -> AppResult<PathBuf> {
    let invalid = || {
        AppError::with_message(ErrorCode::InvalidStoragePath, format!("Invalid storage path: {}", path))
    };
    if path.trim().is_empty() || path.contains('\\') {
        return Err(invalid());
    }
    let relative = Path::new(path);
    if !relative.components().all(|c| matches!(c, Component::Normal(_))) {
        return Err(invalid());
    }
    Ok(relative.to_path_buf())
}

/// Filesystem-backed object store
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
    base_url: String,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn upload(&self, path: &str, bytes: &[u8]) -> AppResult<String> {
        if bytes.is_empty() {
            return Err(AppError::new(ErrorCode::EmptyFile));
        }
        if bytes.len() > MAX_FILE_SIZE {
            return Err(AppError::with_message(
                ErrorCode::FileTooLarge,
                format!(
                    "File too large. Maximum size is {} bytes ({}MB)",
                    MAX_FILE_SIZE,
                    MAX_FILE_SIZE / 1024 / 1024
                ),
            ));
        }

        let target = self.root.join(validate_path(path)?);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_message(ErrorCode::FileStorageFailed, format!("Failed to create dir: {}", e))
            })?;
        }
        fs::write(&target, bytes).await.map_err(|e| {
            AppError::with_message(ErrorCode::FileStorageFailed, format!("Failed to write object: {}", e))
        })?;

        tracing::info!(path = %path, size = bytes.len(), "Object uploaded");
        Ok(self.url_for(path))
    }

    async fn delete(&self, path: &str) -> AppResult<bool> {
        let target = self.root.join(validate_path(path)?);
        match fs::remove_file(&target).await {
            Ok(()) => {
                tracing::info!(path = %path, "Object deleted");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AppError::with_message(
                ErrorCode::FileStorageFailed,
                format!("Failed to delete object {}: {}", path, e),
            )),
        }
    }

    fn path_for_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(&self.base_url)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|rest| !rest.is_empty())
            .map(str::to_string)
    }
}
