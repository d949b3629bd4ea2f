//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the book platform core and
//! platform-specific implementations. Each trait represents a capability that
//! the core requires but that must be implemented differently per platform
//! (desktop, iOS, Android).
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations with TLS
//! - [`FileSystemAccess`](storage::FileSystemAccess) - File I/O for the asset cache
//! - [`NetworkMonitor`](network::NetworkMonitor) - Connectivity detection
//!
//! ## Error Handling
//!
//! All trait methods return [`error::Result`], with [`error::BridgeError`]
//! describing missing capabilities, failed operations, and I/O problems.

pub mod error;
pub mod http;
pub mod network;
pub mod storage;

pub use error::{BridgeError, Result};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use network::{NetworkInfo, NetworkMonitor, NetworkStatus};
pub use storage::{FileMetadata, FileSystemAccess};
