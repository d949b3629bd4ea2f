//! # Desktop Bridge Implementations
//!
//! Desktop implementations of the [`bridge_traits`] capabilities:
//!
//! - [`TokioFileSystem`](filesystem::TokioFileSystem) - async file I/O via `tokio::fs`
//! - [`ReqwestHttpClient`](http::ReqwestHttpClient) - HTTP via `reqwest`
//! - [`DesktopNetworkMonitor`](network::DesktopNetworkMonitor) - TCP-probe connectivity

pub mod filesystem;
pub mod http;
pub mod network;

pub use filesystem::TokioFileSystem;
pub use http::ReqwestHttpClient;
pub use network::DesktopNetworkMonitor;
