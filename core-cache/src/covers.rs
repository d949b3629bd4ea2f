//! # Cover Cache
//!
//! In-memory, time-bounded cache of generated cover images for books lacking
//! one. Generation is deterministic (colors derived from a hash of the book
//! id) and cheap relative to network I/O, so losing the cache on restart is
//! acceptable.

use crate::error::{CacheError, Result};
use bytes::Bytes;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::debug;

/// How long a generated cover stays fresh
pub const COVER_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

const COVER_WIDTH: u32 = 300;
const COVER_HEIGHT: u32 = 400;

struct CoverEntry {
    image: Bytes,
    cached_at: Instant,
}

/// Memoizing generator of placeholder cover images, keyed by book id
///
/// One instance per process by convention, shared via `Arc`. No durability:
/// process restart loses the cache.
pub struct CoverCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CoverEntry>>,
}

impl CoverCache {
    pub fn new() -> Self {
        Self::with_ttl(COVER_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Get the cover for a book, generating and caching it when absent or
    /// past its TTL
    pub async fn get(&self, id: &str, title: &str, file_type: &str) -> Result<Bytes> {
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(id) {
                if entry.cached_at.elapsed() < self.ttl {
                    return Ok(entry.image.clone());
                }
            }
        }

        let image = generate_cover(id, title, file_type)?;
        debug!(id = %id, size = image.len(), "Generated cover image");

        let mut entries = self.entries.write().await;
        entries.insert(
            id.to_string(),
            CoverEntry {
                image: image.clone(),
                cached_at: Instant::now(),
            },
        );

        Ok(image)
    }

    /// Drop the cached cover for one book
    pub async fn invalidate(&self, id: &str) {
        self.entries.write().await.remove(id);
    }

    /// Evict every entry past its TTL; returns the number evicted
    pub async fn sweep_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.cached_at.elapsed() < self.ttl);
        let evicted = before - entries.len();
        if evicted > 0 {
            debug!(evicted = evicted, "Swept expired covers");
        }
        evicted
    }

    /// Number of currently cached covers
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Spawn a background task running `sweep_expired` on an interval
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                cache.sweep_expired().await;
            }
        })
    }
}

impl Default for CoverCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a deterministic placeholder cover as PNG bytes
///
/// The palette is derived from a SHA-256 of the book identity, so repeated
/// generation for the same book yields identical bytes.
fn generate_cover(id: &str, title: &str, file_type: &str) -> Result<Bytes> {
    let mut hasher = Sha256::new();
    hasher.update(id.as_bytes());
    hasher.update(title.as_bytes());
    hasher.update(file_type.as_bytes());
    let digest = hasher.finalize();

    let base = [digest[0], digest[1], digest[2]];
    let accent = [digest[3], digest[4], digest[5]];
    // Band height varies per book but always leaves most of the cover to the
    // background gradient.
    let band_height = COVER_HEIGHT / 5 + (digest[6] as u32 % (COVER_HEIGHT / 5));

    let img = RgbaImage::from_fn(COVER_WIDTH, COVER_HEIGHT, |_, y| {
        if y < band_height {
            Rgba([accent[0], accent[1], accent[2], 255])
        } else {
            // Vertical gradient darkening toward the bottom edge
            let t = (y - band_height) as f32 / (COVER_HEIGHT - band_height) as f32;
            let shade = |c: u8| (c as f32 * (1.0 - 0.4 * t)) as u8;
            Rgba([shade(base[0]), shade(base[1]), shade(base[2]), 255])
        }
    });

    let mut buffer = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| CacheError::Image(e.to_string()))?;

    Ok(Bytes::from(buffer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_generation_is_deterministic_and_memoized() {
        let cache = CoverCache::new();

        let first = cache.get("b1", "My Book", "epub").await.unwrap();
        let second = cache.get("b1", "My Book", "epub").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.len().await, 1);

        // PNG signature
        assert_eq!(&first[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    }

    #[tokio::test]
    async fn test_distinct_books_get_distinct_covers() {
        let cache = CoverCache::new();

        let a = cache.get("b1", "My Book", "epub").await.unwrap();
        let b = cache.get("b2", "Other Book", "epub").await.unwrap();
        assert_ne!(a, b);
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache = CoverCache::new();
        cache.get("b1", "My Book", "epub").await.unwrap();

        cache.invalidate("b1").await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_sweep_evicts_only_expired_entries() {
        let cache = CoverCache::with_ttl(Duration::ZERO);
        cache.get("b1", "My Book", "epub").await.unwrap();
        cache.get("b2", "Other Book", "pdf").await.unwrap();

        assert_eq!(cache.sweep_expired().await, 2);
        assert!(cache.is_empty().await);

        let cache = CoverCache::new();
        cache.get("b1", "My Book", "epub").await.unwrap();
        assert_eq!(cache.sweep_expired().await, 0);
        assert_eq!(cache.len().await, 1);
    }
}
