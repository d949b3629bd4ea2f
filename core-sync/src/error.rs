use bridge_traits::error::BridgeError;
use core_cache::CacheError;
use core_library::LibraryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Book {id} not found")]
    BookNotFound { id: String },

    #[error("Book {id} is not a manual import and cannot be removed")]
    PermissionDenied { id: String },

    #[error("Library error: {0}")]
    Library(#[from] LibraryError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),
}

pub type Result<T> = std::result::Result<T, SyncError>;
