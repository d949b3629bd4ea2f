use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Cache not initialized")]
    NotInitialized,

    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Fetch failed for {url}: HTTP {status}")]
    Fetch { url: String, status: u16 },

    #[error("Image error: {0}")]
    Image(String),
}

pub type Result<T> = std::result::Result<T, CacheError>;
