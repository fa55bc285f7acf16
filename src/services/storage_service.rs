// src/services/storage_service.rs
use crate::error::AppResult;
use std::path::PathBuf;

/// Disk-backed file storage. The rest of the system only ever sees the
/// locator string this returns and never inspects file content.
#[derive(Debug, Clone)]
pub struct StorageService {
    root: PathBuf,
}

impl StorageService {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root comes from FILE_STORAGE_ROOT, defaulting to ./uploads.
    pub fn from_env() -> Self {
        let root = std::env::var("FILE_STORAGE_ROOT").unwrap_or_else(|_| "./uploads".to_string());
        Self::new(root)
    }

    /// Store a file under the given object key (e.g. "2026-08/<uuid>.pdf")
    /// and return an opaque file:// locator for it.
    pub async fn store(&self, bytes: &[u8], object_key: &str) -> AppResult<String> {
        let dest = self.root.join(object_key);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&dest, bytes).await?;

        // Canonicalize so the locator survives a later working-dir change.
        let absolute = tokio::fs::canonicalize(&dest).await?;
        let locator = format!("file://{}", absolute.display());
        tracing::debug!("Stored {} bytes at {}", bytes.len(), locator);
        Ok(locator)
    }
}
