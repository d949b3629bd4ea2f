//! Book repository trait and implementation

use crate::error::{LibraryError, Result};
use crate::models::{parse_opaque_json, parse_string_list, parse_timestamp, Book, BookId};
use async_trait::async_trait;
use sqlx::{query_as, FromRow, SqlitePool};

/// Book repository interface for data access operations
///
/// One row per id: `upsert` replaces by primary key, so the store never
/// contains two records with the same id.
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Insert or replace a book by its id
    ///
    /// # Errors
    /// Returns error if:
    /// - Book validation fails
    /// - Database error occurs
    async fn upsert(&self, book: &Book) -> Result<()>;

    /// Find a book by its ID
    ///
    /// # Returns
    /// - `Ok(Some(book))` if found
    /// - `Ok(None)` if not found
    /// - `Err` if database error occurs
    async fn find_by_id(&self, id: &str) -> Result<Option<Book>>;

    /// Full scan of all books; ordering is not significant
    async fn list_all(&self) -> Result<Vec<Book>>;

    /// Delete a book by ID
    ///
    /// # Returns
    /// - `Ok(true)` if the book was deleted
    /// - `Ok(false)` if the book was not found (not an error)
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Count total books
    async fn count(&self) -> Result<i64>;
}

/// SQLite implementation of BookRepository
pub struct SqliteBookRepository {
    pool: SqlitePool,
}

impl SqliteBookRepository {
    /// Create a new SQLite book repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a book
///
/// Booleans are 0/1 integers, timestamps RFC 3339 text, and list/object
/// attributes serialized JSON text.
#[derive(Debug, FromRow)]
struct BookRow {
    id: String,
    title: String,
    author: Option<String>,
    book_language: Option<String>,
    content_category: Option<String>,
    content_url: Option<String>,
    cover_image: Option<String>,
    narration_url: Option<String>,
    podcast_url: Option<String>,
    local_content_path: Option<String>,
    local_narration_path: Option<String>,
    local_podcast_path: Option<String>,
    current_page: i64,
    total_pages: i64,
    read_progress: f64,
    audio_progress: f64,
    last_read: Option<String>,
    is_favorite: bool,
    highlighted_words: String,
    difficult_words: String,
    vocab_mastery: Option<String>,
    is_manual: bool,
    synced_with_supabase: bool,
    cache_expiry: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<BookRow> for Book {
    type Error = LibraryError;

    fn try_from(row: BookRow) -> Result<Self> {
        // Required timestamps must parse; corrupt values are a storage fault.
        let created_at = parse_timestamp(&row.created_at).ok_or_else(|| {
            LibraryError::Serialization(format!("invalid created_at for book {}", row.id))
        })?;
        let updated_at = parse_timestamp(&row.updated_at).ok_or_else(|| {
            LibraryError::Serialization(format!("invalid updated_at for book {}", row.id))
        })?;

        // Optional timestamps and JSON columns degrade instead of failing:
        // a corrupt cache_expiry reads as "expired", corrupt lists as empty.
        Ok(Book {
            id: BookId::new(row.id),
            title: row.title,
            author: row.author,
            book_language: row.book_language,
            content_category: row.content_category,
            content_url: row.content_url,
            cover_image: row.cover_image,
            narration_url: row.narration_url,
            podcast_url: row.podcast_url,
            local_content_path: row.local_content_path,
            local_narration_path: row.local_narration_path,
            local_podcast_path: row.local_podcast_path,
            current_page: row.current_page,
            total_pages: row.total_pages,
            read_progress: row.read_progress,
            audio_progress: row.audio_progress,
            last_read: row.last_read.as_deref().and_then(parse_timestamp),
            is_favorite: row.is_favorite,
            highlighted_words: parse_string_list(&row.highlighted_words),
            difficult_words: parse_string_list(&row.difficult_words),
            vocab_mastery: parse_opaque_json(row.vocab_mastery.as_deref()),
            is_manual: row.is_manual,
            synced_with_supabase: row.synced_with_supabase,
            cache_expiry: row.cache_expiry.as_deref().and_then(parse_timestamp),
            created_at,
            updated_at,
        })
    }
}

const BOOK_COLUMNS: &str = "\
    id, title, author, book_language, content_category, \
    content_url, cover_image, narration_url, podcast_url, \
    local_content_path, local_narration_path, local_podcast_path, \
    current_page, total_pages, read_progress, audio_progress, last_read, is_favorite, \
    highlighted_words, difficult_words, vocab_mastery, \
    is_manual, synced_with_supabase, cache_expiry, created_at, updated_at";

#[async_trait]
impl BookRepository for SqliteBookRepository {
    async fn upsert(&self, book: &Book) -> Result<()> {
        book.validate().map_err(|msg| LibraryError::InvalidInput {
            field: "book".to_string(),
            message: msg,
        })?;

        let highlighted_words = serde_json::to_string(&book.highlighted_words)
            .map_err(|e| LibraryError::Serialization(e.to_string()))?;
        let difficult_words = serde_json::to_string(&book.difficult_words)
            .map_err(|e| LibraryError::Serialization(e.to_string()))?;
        let vocab_mastery = if book.vocab_mastery.is_null() {
            None
        } else {
            Some(
                serde_json::to_string(&book.vocab_mastery)
                    .map_err(|e| LibraryError::Serialization(e.to_string()))?,
            )
        };

        sqlx::query(
            r#"
            INSERT INTO books (
                id, title, author, book_language, content_category,
                content_url, cover_image, narration_url, podcast_url,
                local_content_path, local_narration_path, local_podcast_path,
                current_page, total_pages, read_progress, audio_progress, last_read, is_favorite,
                highlighted_words, difficult_words, vocab_mastery,
                is_manual, synced_with_supabase, cache_expiry, created_at, updated_at
            ) VALUES (
                ?, ?, ?, ?, ?,
                ?, ?, ?, ?,
                ?, ?, ?,
                ?, ?, ?, ?, ?, ?,
                ?, ?, ?,
                ?, ?, ?, ?, ?
            )
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                author = excluded.author,
                book_language = excluded.book_language,
                content_category = excluded.content_category,
                content_url = excluded.content_url,
                cover_image = excluded.cover_image,
                narration_url = excluded.narration_url,
                podcast_url = excluded.podcast_url,
                local_content_path = excluded.local_content_path,
                local_narration_path = excluded.local_narration_path,
                local_podcast_path = excluded.local_podcast_path,
                current_page = excluded.current_page,
                total_pages = excluded.total_pages,
                read_progress = excluded.read_progress,
                audio_progress = excluded.audio_progress,
                last_read = excluded.last_read,
                is_favorite = excluded.is_favorite,
                highlighted_words = excluded.highlighted_words,
                difficult_words = excluded.difficult_words,
                vocab_mastery = excluded.vocab_mastery,
                is_manual = excluded.is_manual,
                synced_with_supabase = excluded.synced_with_supabase,
                cache_expiry = excluded.cache_expiry,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(book.id.as_str())
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.book_language)
        .bind(&book.content_category)
        .bind(&book.content_url)
        .bind(&book.cover_image)
        .bind(&book.narration_url)
        .bind(&book.podcast_url)
        .bind(&book.local_content_path)
        .bind(&book.local_narration_path)
        .bind(&book.local_podcast_path)
        .bind(book.current_page)
        .bind(book.total_pages)
        .bind(book.read_progress)
        .bind(book.audio_progress)
        .bind(book.last_read.map(|t| t.to_rfc3339()))
        .bind(book.is_favorite)
        .bind(highlighted_words)
        .bind(difficult_words)
        .bind(vocab_mastery)
        .bind(book.is_manual)
        .bind(book.synced_with_supabase)
        .bind(book.cache_expiry.map(|t| t.to_rfc3339()))
        .bind(book.created_at.to_rfc3339())
        .bind(book.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Book>> {
        let row = query_as::<_, BookRow>(&format!(
            "SELECT {} FROM books WHERE id = ?",
            BOOK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Book::try_from).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Book>> {
        let rows = query_as::<_, BookRow>(&format!("SELECT {} FROM books", BOOK_COLUMNS))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Book::try_from).collect()
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;

        Ok(row.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use chrono::{Duration, Utc};

    fn sample_book(id: &str) -> Book {
        let mut book = Book::new_manual("The Name of the Wind");
        book.id = BookId::new(id);
        book.author = Some("Patrick Rothfuss".to_string());
        book.book_language = Some("en".to_string());
        book.highlighted_words = vec!["lute".to_string(), "sympathy".to_string()];
        book.difficult_words = vec!["arcanum".to_string()];
        book.vocab_mastery = serde_json::json!({ "lute": 2 });
        book
    }

    async fn repo() -> SqliteBookRepository {
        let pool = create_test_pool().await.unwrap();
        SqliteBookRepository::new(pool)
    }

    #[tokio::test]
    async fn test_upsert_and_find_round_trip() {
        let repo = repo().await;
        let book = sample_book("b1");

        repo.upsert(&book).await.unwrap();
        let found = repo.find_by_id("b1").await.unwrap().unwrap();

        assert_eq!(found.title, book.title);
        assert_eq!(found.author, book.author);
        assert_eq!(found.highlighted_words, book.highlighted_words);
        assert_eq!(found.difficult_words, book.difficult_words);
        assert_eq!(found.vocab_mastery, book.vocab_mastery);
        assert!(found.is_manual);
        assert!(!found.synced_with_supabase);
    }

    #[tokio::test]
    async fn test_upsert_last_write_wins_per_id() {
        let repo = repo().await;

        let mut book = sample_book("b1");
        repo.upsert(&book).await.unwrap();

        book.title = "The Wise Man's Fear".to_string();
        book.read_progress = 42.0;
        repo.upsert(&book).await.unwrap();
        repo.upsert(&sample_book("b2")).await.unwrap();

        let all = repo.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(repo.count().await.unwrap(), 2);

        let b1 = all.iter().find(|b| b.id.as_str() == "b1").unwrap();
        assert_eq!(b1.title, "The Wise Man's Fear");
        assert_eq!(b1.read_progress, 42.0);
    }

    #[tokio::test]
    async fn test_find_missing_is_none() {
        let repo = repo().await;
        assert!(repo.find_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_is_noop() {
        let repo = repo().await;
        assert!(!repo.delete("nope").await.unwrap());

        repo.upsert(&sample_book("b1")).await.unwrap();
        assert!(repo.delete("b1").await.unwrap());
        assert!(repo.find_by_id("b1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_optional_timestamps_round_trip() {
        let repo = repo().await;
        let now = Utc::now();

        let mut book = sample_book("b1");
        book.is_manual = false;
        book.synced_with_supabase = true;
        book.cache_expiry = Some(now + Duration::days(7));
        book.last_read = Some(now - Duration::hours(3));
        repo.upsert(&book).await.unwrap();

        let found = repo.find_by_id("b1").await.unwrap().unwrap();
        assert_eq!(
            found.cache_expiry.unwrap().timestamp(),
            (now + Duration::days(7)).timestamp()
        );
        assert_eq!(
            found.last_read.unwrap().timestamp(),
            (now - Duration::hours(3)).timestamp()
        );
    }

    #[tokio::test]
    async fn test_corrupt_json_columns_read_as_empty() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqliteBookRepository::new(pool.clone());

        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO books (id, title, highlighted_words, difficult_words, vocab_mastery, created_at, updated_at)
            VALUES ('b1', 'Corrupted', 'not json', '{bad', 'also bad', ?, ?)
            "#,
        )
        .bind(&now)
        .bind(&now)
        .execute(&pool)
        .await
        .unwrap();

        let found = repo.find_by_id("b1").await.unwrap().unwrap();
        assert!(found.highlighted_words.is_empty());
        assert!(found.difficult_words.is_empty());
        assert_eq!(found.vocab_mastery, serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_upsert_rejects_invalid_progress() {
        let repo = repo().await;
        let mut book = sample_book("b1");
        book.read_progress = 120.0;

        let result = repo.upsert(&book).await;
        assert!(matches!(result, Err(LibraryError::InvalidInput { .. })));
    }
}
