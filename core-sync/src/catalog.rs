//! External collaborator interfaces
//!
//! The remote catalog and the document parser are consumed as trait
//! interfaces only; their implementations live with the host application.

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the remote catalog: the remote-owned subset of a book record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteBook {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub book_language: Option<String>,
    #[serde(default)]
    pub content_category: Option<String>,
    #[serde(default)]
    pub content_url: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub narration_url: Option<String>,
    #[serde(default)]
    pub podcast_url: Option<String>,
    #[serde(default)]
    pub current_page: i64,
    #[serde(default)]
    pub total_pages: i64,
    #[serde(default)]
    pub read_progress: f64,
    #[serde(default)]
    pub audio_progress: f64,
    #[serde(default)]
    pub last_read: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub highlighted_words: Vec<String>,
    #[serde(default)]
    pub difficult_words: Vec<String>,
    #[serde(default)]
    pub vocab_mastery: serde_json::Value,
    /// Server-side modification time; used by the merge progress guard
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Authenticated record API of the remote catalog
#[async_trait]
pub trait RemoteCatalog: Send + Sync {
    /// List every book row visible to the current user
    async fn list_books(&self) -> BridgeResult<Vec<RemoteBook>>;

    /// Push a reading-progress value for one book
    async fn update_progress(&self, id: &str, progress: f64) -> BridgeResult<()>;
}

/// Document content parser
///
/// Only consulted at manual-import time, never during reconciliation.
#[async_trait]
pub trait DocumentParser: Send + Sync {
    /// Extract an embedded cover image from a raw book file, if present
    async fn extract_cover(&self, file: &Bytes) -> BridgeResult<Option<Bytes>>;
}
