//! File storage for uploaded images.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use axum::body::Bytes;

use crate::error::{ApiError, ApiResult};

/// A file read back from storage.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub content_type: &'static str,
    pub bytes: Bytes,
}

#[async_trait]
pub trait StorageService: Send + Sync {
    /// Store `bytes` under a fresh name derived from `original_name` and
    /// return that name.
    async fn write_file(&self, original_name: &str, bytes: Bytes) -> ApiResult<String>;

    async fn read_file(&self, name: &str) -> ApiResult<StoredFile>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid file name: {0:?}")]
    InvalidName(String),

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidName(_) | StorageError::NotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            StorageError::Io(_) => ApiError::Internal(err.to_string()),
        }
    }
}

/// Stores files in a local directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    dir: PathBuf,
}

impl LocalStorage {
    /// Use `dir`, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Resolve a stored name to a path inside the storage directory.
    fn resolve(&self, name: &str) -> Result<PathBuf, StorageError> {
        let plain = Path::new(name).file_name().and_then(|n| n.to_str());
        match plain {
            Some(plain) if plain == name && !name.starts_with('.') => Ok(self.dir.join(name)),
            _ => Err(StorageError::InvalidName(name.to_string())),
        }
    }
}

/// Keep the final path component of a client-supplied name, minus anything
/// that could escape the storage directory.
fn sanitize(original_name: &str) -> String {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim_start_matches('.');
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    if cleaned.is_empty() { "file".to_string() } else { cleaned }
}

/// Content type for a stored image, by extension.
pub fn content_type_for(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("apng") => "image/apng",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl StorageService for LocalStorage {
    async fn write_file(&self, original_name: &str, bytes: Bytes) -> ApiResult<String> {
        let name = format!("{}{}", chrono::Utc::now().timestamp_millis(), sanitize(original_name));
        let path = self.resolve(&name)?;
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(StorageError::from)?;
        tracing::debug!(file = %name, bytes = bytes.len(), "file stored");
        Ok(name)
    }

    async fn read_file(&self, name: &str) -> ApiResult<StoredFile> {
        let path = self.resolve(name)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(name.to_string()).into());
            }
            Err(e) => return Err(StorageError::from(e).into()),
        };
        Ok(StoredFile {
            content_type: content_type_for(name),
            bytes: Bytes::from(bytes),
        })
    }
}
