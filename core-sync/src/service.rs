//! # Book Service
//!
//! The reconciler: merges remote catalog rows with local records, populates
//! blob-cache pointers, and arbitrates manual imports against synced state.
//!
//! ## Overview
//!
//! Reads always come from the local record store first. When the network is
//! reachable, a fetch pass merges the remote catalog into the store and
//! refreshes each synced record's expiry window. Manual records are local
//! property: merges never touch them and the remote catalog never sees them.

use crate::catalog::{DocumentParser, RemoteBook, RemoteCatalog};
use crate::error::{Result, SyncError};
use bridge_traits::network::NetworkMonitor;
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use core_cache::{AssetPurpose, BlobCache};
use core_library::{
    create_pool, Book, BookId, BookRepository, DatabaseConfig, SqliteBookRepository,
    MANUAL_ID_PREFIX,
};
use core_runtime::CoreConfig;
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// How long a merged synced record stays fresh before requiring a re-merge
pub const CACHE_TTL_DAYS: i64 = 7;

/// Outcome of the remote leg of a progress update
///
/// The local write has already succeeded in every variant; this only reports
/// what happened (or did not happen) upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteUpdateStatus {
    /// No remote push was attempted (manual record, or offline)
    Skipped,
    /// The remote catalog accepted the new progress value
    Applied,
    /// The remote push failed; the value will reconcile on a later pass
    Failed(String),
}

/// Reconciliation service over the record store, blob cache, and remote
/// catalog.
pub struct BookService {
    books: Arc<dyn BookRepository>,
    blobs: Arc<BlobCache>,
    catalog: Arc<dyn RemoteCatalog>,
    parser: Arc<dyn DocumentParser>,
    network: Arc<dyn NetworkMonitor>,
    /// Asset downloads currently being written, keyed by record and purpose.
    /// At most one cache write per key may be active at a time.
    in_flight: Mutex<HashSet<(String, AssetPurpose)>>,
}

impl BookService {
    pub fn new(
        books: Arc<dyn BookRepository>,
        blobs: Arc<BlobCache>,
        catalog: Arc<dyn RemoteCatalog>,
        parser: Arc<dyn DocumentParser>,
        network: Arc<dyn NetworkMonitor>,
    ) -> Self {
        Self {
            books,
            blobs,
            catalog,
            parser,
            network,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Assemble the service from a validated [`CoreConfig`]
    ///
    /// Opens the database, runs migrations, and initializes the blob cache
    /// before returning; any failure here is a startup failure.
    pub async fn from_config(
        config: &CoreConfig,
        catalog: Arc<dyn RemoteCatalog>,
        parser: Arc<dyn DocumentParser>,
    ) -> Result<Self> {
        let pool = create_pool(DatabaseConfig::new(&config.database_path)).await?;
        let books = Arc::new(SqliteBookRepository::new(pool));

        let blobs = Arc::new(BlobCache::new(
            config.file_system.clone(),
            config.http_client.clone(),
        ));
        blobs.initialize().await?;

        Ok(Self::new(
            books,
            blobs,
            catalog,
            parser,
            config.network_monitor.clone(),
        ))
    }

    // =========================================================================
    // Fetch / merge
    // =========================================================================

    /// Return the current library, merging in the remote catalog when online
    ///
    /// Offline (or when the catalog call fails) this degrades to the cached
    /// library: every manual record plus every synced record that has not
    /// passed its expiry. Online, each remote row is merged, its assets are
    /// populated, and the result is persisted with a fresh expiry window.
    #[instrument(skip(self))]
    pub async fn fetch_books(&self) -> Result<Vec<Book>> {
        let local = self.books.list_all().await?;
        let now = Utc::now();

        let (valid, stale): (Vec<Book>, Vec<Book>) =
            local.iter().cloned().partition(|b| !b.is_expired(now));
        if !stale.is_empty() {
            debug!(count = stale.len(), "Excluding expired synced records");
        }

        if !self.network.is_connected().await {
            info!(count = valid.len(), "Offline, serving cached library");
            return Ok(valid);
        }

        let remote = match self.catalog.list_books().await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "Remote catalog unreachable, serving cached library");
                return Ok(valid);
            }
        };
        debug!(count = remote.len(), "Merging remote catalog");

        let by_id: HashMap<String, Book> = local
            .into_iter()
            .map(|b| (b.id.to_string(), b))
            .collect();

        // Manual records are local property: a remote row reusing a manual
        // id (or the reserved prefix) must never convert one. Duplicate rows
        // would otherwise duplicate the returned view, so only the first per
        // id is merged.
        let mut seen = HashSet::new();
        let merges: Vec<_> = remote
            .into_iter()
            .filter(|row| {
                if !seen.insert(row.id.clone()) {
                    warn!(id = %row.id, "Ignoring duplicate remote row");
                    return false;
                }
                let collides_with_manual = row.id.starts_with(MANUAL_ID_PREFIX)
                    || by_id.get(&row.id).is_some_and(|b| b.is_manual);
                if collides_with_manual {
                    warn!(id = %row.id, "Ignoring remote row colliding with a manual record");
                    return false;
                }
                true
            })
            .map(|row| {
                let existing = by_id.get(&row.id).cloned();
                self.merge_one(row, existing)
            })
            .collect();
        let mut books = join_all(merges).await;

        // Manual records never appear in the catalog and are appended as-is.
        books.extend(valid.into_iter().filter(|b| b.is_manual));

        info!(count = books.len(), "Library fetch complete");
        Ok(books)
    }

    /// Merge one remote row, populate its assets, and persist the result
    ///
    /// A persistence failure is logged and the merged record is still
    /// returned; the next fetch pass will retry the write.
    async fn merge_one(&self, row: RemoteBook, existing: Option<Book>) -> Book {
        let mut book = merge_record(row, existing.as_ref(), Utc::now());
        self.populate_assets(&mut book).await;

        if let Err(e) = self.books.upsert(&book).await {
            warn!(id = %book.id, error = %e, "Failed to persist merged record");
        }
        book
    }

    /// Download and pin any remote assets that are not yet cached locally
    ///
    /// Idempotent per field: an already-populated local path is left alone.
    /// Individual download failures are logged and leave the field `None` so
    /// a later pass retries.
    async fn populate_assets(&self, book: &mut Book) {
        let targets = [
            (AssetPurpose::Content, book.content_url.clone(), book.local_content_path.is_some()),
            (AssetPurpose::Narration, book.narration_url.clone(), book.local_narration_path.is_some()),
            (AssetPurpose::Podcast, book.podcast_url.clone(), book.local_podcast_path.is_some()),
        ];

        for (purpose, url, cached) in targets {
            if cached {
                continue;
            }
            let Some(url) = url else {
                continue;
            };

            if let Some(path) = self.cache_asset(book.id.as_str(), &url, purpose).await {
                match purpose {
                    AssetPurpose::Content => book.local_content_path = Some(path),
                    AssetPurpose::Narration => book.local_narration_path = Some(path),
                    AssetPurpose::Podcast => book.local_podcast_path = Some(path),
                    AssetPurpose::Cover => {}
                }
            }
        }
    }

    /// Download one asset into the blob cache, guarded against concurrent
    /// writes for the same record and purpose.
    async fn cache_asset(
        &self,
        book_id: &str,
        url: &str,
        purpose: AssetPurpose,
    ) -> Option<String> {
        let key = (book_id.to_string(), purpose);
        {
            let mut in_flight = self.in_flight.lock().await;
            if !in_flight.insert(key.clone()) {
                debug!(id = %book_id, purpose = %purpose, "Cache write already in flight");
                return None;
            }
        }

        let result = self.blobs.store(url, purpose).await;
        self.in_flight.lock().await.remove(&key);

        match result {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(id = %book_id, purpose = %purpose, error = %e, "Asset caching failed");
                None
            }
        }
    }

    // =========================================================================
    // Manual imports
    // =========================================================================

    /// Import a user-provided book file as a manual record
    ///
    /// The file bytes are pinned in the blob cache immediately. The cover
    /// comes from `cover_url` when given, otherwise from the document parser;
    /// a parser failure downgrades to no cover rather than failing the
    /// import.
    #[instrument(skip(self, file))]
    pub async fn add_manual_book(
        &self,
        file: Bytes,
        title: &str,
        cover_url: Option<String>,
    ) -> Result<Book> {
        let mut book = Book::new_manual(title);

        book.local_content_path = Some(
            self.blobs
                .store_bytes(file.clone(), AssetPurpose::Content)
                .await?,
        );

        book.cover_image = match cover_url {
            Some(url) => Some(url),
            None => match self.parser.extract_cover(&file).await {
                Ok(Some(cover)) => Some(
                    self.blobs
                        .store_bytes(cover, AssetPurpose::Cover)
                        .await?,
                ),
                Ok(None) => None,
                Err(e) => {
                    warn!(id = %book.id, error = %e, "Cover extraction failed");
                    None
                }
            },
        };

        self.books.upsert(&book).await?;
        info!(id = %book.id, title = %book.title, "Imported manual book");
        Ok(book)
    }

    /// Remove a manual record and its cached blobs
    ///
    /// # Errors
    ///
    /// [`SyncError::BookNotFound`] when no record has this id, and
    /// [`SyncError::PermissionDenied`] when the record is remote-synced;
    /// synced records are owned by the catalog and only expire locally.
    #[instrument(skip(self))]
    pub async fn remove_book(&self, id: &str) -> Result<()> {
        let book = self
            .books
            .find_by_id(id)
            .await?
            .ok_or_else(|| SyncError::BookNotFound { id: id.to_string() })?;

        if !book.is_manual {
            return Err(SyncError::PermissionDenied { id: id.to_string() });
        }

        self.books.delete(id).await?;

        let blobs = [
            book.local_content_path,
            book.local_narration_path,
            book.local_podcast_path,
        ];
        for path in blobs.into_iter().flatten() {
            if let Err(e) = self.blobs.delete(&path).await {
                warn!(id = %id, path = %path, error = %e, "Failed to delete cached blob");
            }
        }

        info!(id = %id, "Removed manual book");
        Ok(())
    }

    // =========================================================================
    // Progress
    // =========================================================================

    /// Record reading progress locally, then best-effort push it upstream
    ///
    /// The local write is authoritative and always happens first. A progress
    /// write counts as a reading session, so `last_read` is stamped along
    /// with `read_progress` and `updated_at`. The remote push is skipped for
    /// manual records and while offline, and a remote failure never rolls
    /// back the local value.
    #[instrument(skip(self))]
    pub async fn update_progress(&self, id: &str, progress: f64) -> Result<RemoteUpdateStatus> {
        let progress = progress.clamp(0.0, 100.0);

        let mut book = self
            .books
            .find_by_id(id)
            .await?
            .ok_or_else(|| SyncError::BookNotFound { id: id.to_string() })?;

        book.read_progress = progress;
        book.last_read = Some(Utc::now());
        book.updated_at = Utc::now();
        self.books.upsert(&book).await?;
        debug!(id = %id, progress = progress, "Recorded local progress");

        if !book.synced_with_supabase {
            return Ok(RemoteUpdateStatus::Skipped);
        }
        if !self.network.is_connected().await {
            debug!(id = %id, "Offline, deferring remote progress update");
            return Ok(RemoteUpdateStatus::Skipped);
        }

        match self.catalog.update_progress(id, progress).await {
            Ok(()) => Ok(RemoteUpdateStatus::Applied),
            Err(e) => {
                warn!(id = %id, error = %e, "Remote progress update failed");
                Ok(RemoteUpdateStatus::Failed(e.to_string()))
            }
        }
    }
}

/// Merge one remote catalog row over the local record, if any
///
/// Remote metadata always wins. Local-only state survives: asset pointers,
/// `created_at`, and, when the local record was modified more recently than
/// the remote row (or the row carries no modification time), the progress
/// fields.
fn merge_record(row: RemoteBook, existing: Option<&Book>, now: DateTime<Utc>) -> Book {
    let mut book = Book {
        id: BookId::new(row.id),
        title: row.title,
        author: row.author,
        book_language: row.book_language,
        content_category: row.content_category,
        content_url: row.content_url,
        cover_image: row.cover_image,
        narration_url: row.narration_url,
        podcast_url: row.podcast_url,
        local_content_path: None,
        local_narration_path: None,
        local_podcast_path: None,
        current_page: row.current_page,
        total_pages: row.total_pages,
        read_progress: row.read_progress,
        audio_progress: row.audio_progress,
        last_read: row.last_read,
        is_favorite: row.is_favorite,
        highlighted_words: row.highlighted_words,
        difficult_words: row.difficult_words,
        vocab_mastery: row.vocab_mastery,
        is_manual: false,
        synced_with_supabase: true,
        cache_expiry: Some(now + Duration::days(CACHE_TTL_DAYS)),
        created_at: now,
        updated_at: now,
    };

    if let Some(prev) = existing {
        book.local_content_path = prev.local_content_path.clone();
        book.local_narration_path = prev.local_narration_path.clone();
        book.local_podcast_path = prev.local_podcast_path.clone();
        book.created_at = prev.created_at;

        // The local record is the source of truth for progress until the
        // remote row is provably newer.
        let local_newer = match row.updated_at {
            Some(remote_at) => prev.updated_at > remote_at,
            None => true,
        };
        if local_newer {
            book.read_progress = prev.read_progress;
            book.current_page = prev.current_page;
            book.audio_progress = prev.audio_progress;
            book.last_read = prev.last_read;
        }
    }

    book
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote_row(id: &str) -> RemoteBook {
        RemoteBook {
            id: id.to_string(),
            title: "Remote Title".to_string(),
            author: Some("Author".to_string()),
            book_language: None,
            content_category: None,
            content_url: Some("https://cdn.example/content.epub".to_string()),
            cover_image: None,
            narration_url: None,
            podcast_url: None,
            current_page: 10,
            total_pages: 200,
            read_progress: 5.0,
            audio_progress: 0.0,
            last_read: None,
            is_favorite: false,
            highlighted_words: vec!["word".to_string()],
            difficult_words: Vec::new(),
            vocab_mastery: serde_json::Value::Null,
            updated_at: None,
        }
    }

    fn local_synced(id: &str, now: DateTime<Utc>) -> Book {
        let mut book = Book::new_manual("Local Title");
        book.id = BookId::new(id);
        book.is_manual = false;
        book.synced_with_supabase = true;
        book.local_content_path = Some("content/123-abc.bin".to_string());
        book.read_progress = 42.0;
        book.current_page = 84;
        book.created_at = now - Duration::days(30);
        book.updated_at = now - Duration::hours(1);
        book
    }

    #[test]
    fn test_merge_fresh_row_without_local_record() {
        let now = Utc::now();
        let book = merge_record(remote_row("b1"), None, now);

        assert_eq!(book.id.as_str(), "b1");
        assert!(!book.is_manual);
        assert!(book.synced_with_supabase);
        assert_eq!(book.cache_expiry, Some(now + Duration::days(CACHE_TTL_DAYS)));
        assert_eq!(book.read_progress, 5.0);
        assert!(book.local_content_path.is_none());
    }

    #[test]
    fn test_merge_preserves_local_paths_and_created_at() {
        let now = Utc::now();
        let prev = local_synced("b1", now);
        let book = merge_record(remote_row("b1"), Some(&prev), now);

        assert_eq!(book.title, "Remote Title");
        assert_eq!(book.local_content_path, prev.local_content_path);
        assert_eq!(book.created_at, prev.created_at);
    }

    #[test]
    fn test_merge_keeps_newer_local_progress() {
        let now = Utc::now();
        let prev = local_synced("b1", now);

        // Remote row modified before the local record was.
        let mut row = remote_row("b1");
        row.updated_at = Some(now - Duration::days(2));
        let book = merge_record(row, Some(&prev), now);
        assert_eq!(book.read_progress, 42.0);
        assert_eq!(book.current_page, 84);

        // No remote modification time at all.
        let book = merge_record(remote_row("b1"), Some(&prev), now);
        assert_eq!(book.read_progress, 42.0);
    }

    #[test]
    fn test_merge_takes_newer_remote_progress() {
        let now = Utc::now();
        let prev = local_synced("b1", now);

        let mut row = remote_row("b1");
        row.updated_at = Some(now);
        let book = merge_record(row, Some(&prev), now);

        assert_eq!(book.read_progress, 5.0);
        assert_eq!(book.current_page, 10);
    }
}
