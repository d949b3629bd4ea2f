//! # Asset Cache Module
//!
//! Owns the persistent blob cache for large binary book assets and the
//! in-memory cover cache.
//!
//! ## Components
//!
//! - **Blob Cache** (`blob`): stores book content, narration, and podcast
//!   audio under generated purpose-tagged paths on the host filesystem
//! - **Cover Cache** (`covers`): memoizes generated placeholder cover images
//!   with a 7-day TTL

pub mod blob;
pub mod covers;
pub mod error;

pub use blob::{AssetPurpose, BlobCache, BlobInfo};
pub use covers::{CoverCache, COVER_TTL};
pub use error::{CacheError, Result};
