//! # Blob Cache
//!
//! Persistent storage for large binary book assets (content, narration,
//! podcast audio, covers) under generated relative paths.
//!
//! Paths are generated, not content-addressed: each asset is fetched once and
//! tied 1:1 to its record, so deduplication has no value here. Uniqueness for
//! the lifetime of the cache comes from the millisecond timestamp plus uuid
//! suffix combined with the purpose tag.

use crate::error::{CacheError, Result};
use bridge_traits::{
    http::{HttpClient, HttpRequest},
    storage::FileSystemAccess,
};
use bytes::Bytes;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// What a cached blob is for; doubles as the subdirectory name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetPurpose {
    Content,
    Narration,
    Podcast,
    Cover,
}

impl AssetPurpose {
    pub const ALL: [AssetPurpose; 4] = [
        AssetPurpose::Content,
        AssetPurpose::Narration,
        AssetPurpose::Podcast,
        AssetPurpose::Cover,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetPurpose::Content => "content",
            AssetPurpose::Narration => "narration",
            AssetPurpose::Podcast => "podcast",
            AssetPurpose::Cover => "covers",
        }
    }
}

impl std::fmt::Display for AssetPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata about one stored blob, for diagnostics
#[derive(Debug, Clone)]
pub struct BlobInfo {
    /// Cache-relative path, as returned by `store`
    pub path: String,
    pub size: u64,
    pub modified_at: Option<i64>,
}

/// Persistent cache for large binary assets
///
/// One instance per process by convention; constructed explicitly and shared
/// via `Arc`. All operations require [`BlobCache::initialize`] to have
/// resolved the cache root first.
pub struct BlobCache {
    fs: Arc<dyn FileSystemAccess>,
    http: Arc<dyn HttpClient>,
    base_path: Mutex<Option<PathBuf>>,
}

impl BlobCache {
    pub fn new(fs: Arc<dyn FileSystemAccess>, http: Arc<dyn HttpClient>) -> Self {
        Self {
            fs,
            http,
            base_path: Mutex::new(None),
        }
    }

    /// Resolve and create the cache root directory
    ///
    /// # Errors
    ///
    /// A failure here is fatal to the component: no blobs can be stored or
    /// served, which callers must surface as "cache unavailable" rather than
    /// an empty cache.
    pub async fn initialize(&self) -> Result<()> {
        let cache_dir = self.fs.get_cache_directory().await.map_err(|e| {
            warn!(error = %e, "Failed to resolve cache directory");
            CacheError::Bridge(e)
        })?;

        let base = cache_dir.join("blobs");
        self.fs.create_dir_all(&base).await?;

        *self.base_path.lock().await = Some(base.clone());
        info!(path = ?base, "Blob cache initialized");
        Ok(())
    }

    /// Resolve a cache-relative path against the cache root
    async fn resolve(&self, local_path: &str) -> Result<PathBuf> {
        let guard = self.base_path.lock().await;
        let base = guard.as_ref().ok_or(CacheError::NotInitialized)?;
        Ok(base.join(local_path))
    }

    /// Generate a fresh cache-relative path for a blob
    fn generate_path(purpose: AssetPurpose) -> String {
        format!(
            "{}/{}-{}.bin",
            purpose.as_str(),
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple()
        )
    }

    /// Fetch bytes from `source_url` and store them under a generated path
    ///
    /// # Returns
    ///
    /// The cache-relative path the blob was stored under.
    ///
    /// # Errors
    ///
    /// Non-2xx responses are a [`CacheError::Fetch`]; transport failures
    /// surface as bridge errors.
    pub async fn store(&self, source_url: &str, purpose: AssetPurpose) -> Result<String> {
        debug!(url = %source_url, purpose = %purpose, "Fetching asset");

        let response = self.http.execute(HttpRequest::get(source_url)).await?;
        if !response.is_success() {
            warn!(url = %source_url, status = response.status, "Asset fetch failed");
            return Err(CacheError::Fetch {
                url: source_url.to_string(),
                status: response.status,
            });
        }

        self.store_bytes(response.body, purpose).await
    }

    /// Store already-materialized bytes under a generated path
    ///
    /// Used for manual imports, where the file bytes come from the user
    /// rather than a remote URL.
    pub async fn store_bytes(&self, data: Bytes, purpose: AssetPurpose) -> Result<String> {
        let local_path = Self::generate_path(purpose);
        let absolute = self.resolve(&local_path).await?;

        if let Some(parent) = absolute.parent() {
            self.fs.create_dir_all(parent).await?;
        }

        let size = data.len();
        self.fs.write_file(&absolute, data).await?;
        debug!(path = %local_path, size = size, "Stored blob");

        Ok(local_path)
    }

    /// Read a previously stored blob
    ///
    /// # Errors
    ///
    /// [`CacheError::NotFound`] when no blob exists at `local_path`.
    pub async fn read(&self, local_path: &str) -> Result<Bytes> {
        let absolute = self.resolve(local_path).await?;

        if !self.fs.exists(&absolute).await? {
            return Err(CacheError::NotFound(local_path.to_string()));
        }

        Ok(self.fs.read_file(&absolute).await?)
    }

    /// Delete a stored blob; a no-op when the path is absent
    pub async fn delete(&self, local_path: &str) -> Result<()> {
        let absolute = self.resolve(local_path).await?;

        if self.fs.exists(&absolute).await? {
            self.fs.delete_file(&absolute).await?;
            debug!(path = %local_path, "Deleted blob");
        }

        Ok(())
    }

    /// Enumerate stored blobs with size/modification metadata
    ///
    /// Diagnostics only; never on a correctness-critical path.
    pub async fn list(&self) -> Result<Vec<BlobInfo>> {
        let guard = self.base_path.lock().await;
        let base = guard.as_ref().ok_or(CacheError::NotInitialized)?.clone();
        drop(guard);

        let mut blobs = Vec::new();
        for purpose in AssetPurpose::ALL {
            let dir = base.join(purpose.as_str());
            if !self.fs.exists(&dir).await? {
                continue;
            }

            for entry in self.fs.list_directory(&dir).await? {
                let metadata = self.fs.metadata(&entry).await?;
                if metadata.is_directory {
                    continue;
                }
                let file_name = entry
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                blobs.push(BlobInfo {
                    path: format!("{}/{}", purpose.as_str(), file_name),
                    size: metadata.size,
                    modified_at: metadata.modified_at,
                });
            }
        }

        Ok(blobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_paths_are_unique_and_tagged() {
        let a = BlobCache::generate_path(AssetPurpose::Content);
        let b = BlobCache::generate_path(AssetPurpose::Content);

        assert_ne!(a, b);
        assert!(a.starts_with("content/"));
        assert!(a.ends_with(".bin"));
        assert!(BlobCache::generate_path(AssetPurpose::Narration).starts_with("narration/"));
        assert!(BlobCache::generate_path(AssetPurpose::Cover).starts_with("covers/"));
    }
}
