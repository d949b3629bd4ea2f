//! Domain models for the book library
//!
//! This module contains the `Book` record, its identifier type, and the
//! JSON-column serialization helpers used at the storage boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Reserved prefix distinguishing locally generated ids of manually imported
/// books from remote-assigned ids.
pub const MANUAL_ID_PREFIX: &str = "manual-";

// =============================================================================
// ID Type
// =============================================================================

/// Unique identifier for a book
///
/// Remote-synced records carry the remote-assigned id verbatim; manual
/// imports generate a `manual-<uuid>` id locally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookId(String);

impl BookId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh locally scoped id for a manual import
    pub fn manual() -> Self {
        Self(format!("{}{}", MANUAL_ID_PREFIX, Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this id carries the reserved manual-import prefix
    pub fn has_manual_prefix(&self) -> bool {
        self.0.starts_with(MANUAL_ID_PREFIX)
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for BookId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for BookId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// =============================================================================
// Sync state
// =============================================================================

/// Sync lifecycle state of a single record
///
/// `Manual` is terminal unless the record is deleted. `Fresh` decays to
/// `Stale` once `cache_expiry` passes and returns to `Fresh` on the next
/// successful re-merge. A record never moves between the manual and synced
/// families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// User-imported record, never expires, never overwritten by merges
    Manual,
    /// Synced record with `cache_expiry` still in the future
    Fresh,
    /// Synced record past `cache_expiry`, hidden from listings until re-merged
    Stale,
}

// =============================================================================
// Book
// =============================================================================

/// The persisted representation of one book's metadata, provenance, and
/// local asset pointers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,

    // Descriptive
    pub title: String,
    pub author: Option<String>,
    pub book_language: Option<String>,
    pub content_category: Option<String>,

    // Remote asset locations
    pub content_url: Option<String>,
    pub cover_image: Option<String>,
    pub narration_url: Option<String>,
    pub podcast_url: Option<String>,

    // Local asset locations (blob-cache-relative; non-null means cached)
    pub local_content_path: Option<String>,
    pub local_narration_path: Option<String>,
    pub local_podcast_path: Option<String>,

    // Progress / state
    pub current_page: i64,
    pub total_pages: i64,
    /// Reading progress, 0-100
    pub read_progress: f64,
    pub audio_progress: f64,
    pub last_read: Option<DateTime<Utc>>,
    pub is_favorite: bool,

    // Annotation state
    pub highlighted_words: Vec<String>,
    pub difficult_words: Vec<String>,
    /// Opaque structured mastery data, passed through untouched
    pub vocab_mastery: serde_json::Value,

    // Provenance / lifecycle
    pub is_manual: bool,
    pub synced_with_supabase: bool,
    /// Only meaningful when `is_manual` is false; the record is stale after
    /// this instant and must be re-merged before being trusted
    pub cache_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Construct a freshly imported manual record with default progress state
    pub fn new_manual(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: BookId::manual(),
            title: title.into(),
            author: None,
            book_language: None,
            content_category: None,
            content_url: None,
            cover_image: None,
            narration_url: None,
            podcast_url: None,
            local_content_path: None,
            local_narration_path: None,
            local_podcast_path: None,
            current_page: 0,
            total_pages: 0,
            read_progress: 0.0,
            audio_progress: 0.0,
            last_read: None,
            is_favorite: false,
            highlighted_words: Vec::new(),
            difficult_words: Vec::new(),
            vocab_mastery: serde_json::Value::Null,
            is_manual: true,
            synced_with_supabase: false,
            cache_expiry: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this record may no longer be trusted without a re-merge
    ///
    /// Manual records never expire. A synced record without a `cache_expiry`
    /// is treated as already expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        if self.is_manual {
            return false;
        }
        match self.cache_expiry {
            Some(expiry) => expiry <= now,
            None => true,
        }
    }

    /// Current sync lifecycle state
    pub fn sync_state(&self, now: DateTime<Utc>) -> SyncState {
        if self.is_manual {
            SyncState::Manual
        } else if self.is_expired(now) {
            SyncState::Stale
        } else {
            SyncState::Fresh
        }
    }

    /// Validate record fields before persistence
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.id.as_str().is_empty() {
            return Err("id must not be empty".to_string());
        }
        if self.title.is_empty() {
            return Err("title must not be empty".to_string());
        }
        if !(0.0..=100.0).contains(&self.read_progress) {
            return Err(format!(
                "read_progress must be within 0-100, got {}",
                self.read_progress
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Storage-boundary serialization helpers
// =============================================================================

/// Parse a JSON list column, degrading to an empty list on corrupt content
pub(crate) fn parse_string_list(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

/// Parse an opaque JSON object column, degrading to `Null` on corrupt content
pub(crate) fn parse_opaque_json(raw: Option<&str>) -> serde_json::Value {
    raw.and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or(serde_json::Value::Null)
}

/// Parse an RFC 3339 timestamp column
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_manual_id_has_reserved_prefix() {
        let id = BookId::manual();
        assert!(id.has_manual_prefix());
        assert_ne!(BookId::manual(), id);

        let remote = BookId::new("b1");
        assert!(!remote.has_manual_prefix());
    }

    #[test]
    fn test_manual_records_never_expire() {
        let book = Book::new_manual("My Book");
        assert!(!book.is_expired(Utc::now() + Duration::days(365)));
        assert_eq!(book.sync_state(Utc::now()), SyncState::Manual);
    }

    #[test]
    fn test_synced_record_freshness() {
        let now = Utc::now();
        let mut book = Book::new_manual("Remote Book");
        book.is_manual = false;
        book.synced_with_supabase = true;

        // No expiry recorded: cannot be trusted
        book.cache_expiry = None;
        assert!(book.is_expired(now));
        assert_eq!(book.sync_state(now), SyncState::Stale);

        book.cache_expiry = Some(now + Duration::days(7));
        assert!(!book.is_expired(now));
        assert_eq!(book.sync_state(now), SyncState::Fresh);

        book.cache_expiry = Some(now - Duration::hours(1));
        assert!(book.is_expired(now));
        assert_eq!(book.sync_state(now), SyncState::Stale);
    }

    #[test]
    fn test_validate() {
        let mut book = Book::new_manual("Valid");
        assert!(book.validate().is_ok());

        book.read_progress = 150.0;
        assert!(book.validate().is_err());

        book.read_progress = 50.0;
        book.title = String::new();
        assert!(book.validate().is_err());
    }

    #[test]
    fn test_parse_string_list_degrades_on_corrupt_content() {
        assert_eq!(parse_string_list(r#"["a","b"]"#), vec!["a", "b"]);
        assert!(parse_string_list("not json").is_empty());
        assert!(parse_string_list("{\"oops\":1}").is_empty());
    }

    #[test]
    fn test_parse_opaque_json() {
        let value = parse_opaque_json(Some(r#"{"word":3}"#));
        assert_eq!(value["word"], 3);
        assert_eq!(parse_opaque_json(Some("broken{")), serde_json::Value::Null);
        assert_eq!(parse_opaque_json(None), serde_json::Value::Null);
    }

    #[test]
    fn test_parse_timestamp() {
        assert!(parse_timestamp("2026-08-25T12:00:00Z").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
