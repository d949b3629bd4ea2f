//! # Repository Pattern Implementation
//!
//! This module provides repository traits and implementations for data access.
//!
//! ## Architecture
//!
//! - Traits define the interface for each repository
//! - SQLite implementations use sqlx for async database access
//! - All operations return `Result<T>` for error handling
//! - Row structs map the fixed column list at the storage boundary, with
//!   lenient parsing of JSON-valued columns

pub mod book;

pub use book::{BookRepository, SqliteBookRepository};
