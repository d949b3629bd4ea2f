//! # Library Management Module
//!
//! Owns the canonical book library database and provides repository patterns
//! for data access.
//!
//! ## Overview
//!
//! This module manages:
//! - SQLite database schema and migrations
//! - The `Book` domain model and its storage-boundary serialization
//! - The `BookRepository` pattern (upsert, point lookup, full scan, delete)

pub mod db;
pub mod error;
pub mod models;
pub mod repositories;

pub use db::{create_pool, create_test_pool, DatabaseConfig};
pub use error::{LibraryError, Result};
pub use models::{Book, BookId, SyncState, MANUAL_ID_PREFIX};
pub use repositories::{BookRepository, SqliteBookRepository};
