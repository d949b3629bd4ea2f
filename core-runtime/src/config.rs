//! # Core Configuration Module
//!
//! Provides configuration management for the book platform core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! [`CoreConfig`] instance that holds the bridge implementations and settings
//! the core needs. It enforces fail-fast validation so a missing capability
//! surfaces at startup with an actionable message instead of deep inside a
//! sync pass.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .database_path("/path/to/library.db")
//!     .http_client(Arc::new(my_http_client))
//!     .file_system(Arc::new(my_file_system))
//!     .network_monitor(Arc::new(my_network_monitor))
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{FileSystemAccess, HttpClient, NetworkMonitor};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Core configuration for the book platform core
///
/// Holds all dependencies and settings required to assemble the core. Use
/// [`CoreConfig::builder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Path to the SQLite database file
    pub database_path: PathBuf,

    /// HTTP client for catalog calls and asset downloads
    pub http_client: Arc<dyn HttpClient>,

    /// File system access for the blob cache
    pub file_system: Arc<dyn FileSystemAccess>,

    /// Network connectivity monitor gating remote work
    pub network_monitor: Arc<dyn NetworkMonitor>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("database_path", &self.database_path)
            .field("http_client", &"HttpClient { ... }")
            .field("file_system", &"FileSystemAccess { ... }")
            .field("network_monitor", &"NetworkMonitor { ... }")
            .finish()
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }
}

/// Builder for [`CoreConfig`]
#[derive(Default)]
pub struct CoreConfigBuilder {
    database_path: Option<PathBuf>,
    http_client: Option<Arc<dyn HttpClient>>,
    file_system: Option<Arc<dyn FileSystemAccess>>,
    network_monitor: Option<Arc<dyn NetworkMonitor>>,
}

impl CoreConfigBuilder {
    pub fn database_path(mut self, path: impl AsRef<Path>) -> Self {
        self.database_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn file_system(mut self, fs: Arc<dyn FileSystemAccess>) -> Self {
        self.file_system = Some(fs);
        self
    }

    pub fn network_monitor(mut self, monitor: Arc<dyn NetworkMonitor>) -> Self {
        self.network_monitor = Some(monitor);
        self
    }

    /// Validate and build the configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the database path is missing and
    /// [`Error::CapabilityMissing`] for each absent bridge implementation.
    pub fn build(self) -> Result<CoreConfig> {
        let database_path = self
            .database_path
            .ok_or_else(|| Error::Config("database_path is required".to_string()))?;

        let http_client = self.http_client.ok_or_else(|| Error::CapabilityMissing {
            capability: "HttpClient".to_string(),
            message: "No HTTP client implementation provided. \
                      Desktop hosts can inject bridge_desktop::ReqwestHttpClient."
                .to_string(),
        })?;

        let file_system = self.file_system.ok_or_else(|| Error::CapabilityMissing {
            capability: "FileSystemAccess".to_string(),
            message: "No file system implementation provided. \
                      Desktop hosts can inject bridge_desktop::TokioFileSystem."
                .to_string(),
        })?;

        let network_monitor = self
            .network_monitor
            .ok_or_else(|| Error::CapabilityMissing {
                capability: "NetworkMonitor".to_string(),
                message: "No network monitor implementation provided. \
                          Desktop hosts can inject bridge_desktop::DesktopNetworkMonitor."
                    .to_string(),
            })?;

        Ok(CoreConfig {
            database_path,
            http_client,
            file_system,
            network_monitor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::{
        error::Result as BridgeResult,
        http::{HttpRequest, HttpResponse},
        network::{NetworkInfo, NetworkStatus},
        storage::FileMetadata,
    };
    use bytes::Bytes;

    struct StubHttp;

    #[async_trait::async_trait]
    impl HttpClient for StubHttp {
        async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
            Ok(HttpResponse {
                status: 200,
                headers: Default::default(),
                body: Bytes::new(),
            })
        }
    }

    struct StubFs;

    #[async_trait::async_trait]
    impl FileSystemAccess for StubFs {
        async fn get_cache_directory(&self) -> BridgeResult<PathBuf> {
            Ok(PathBuf::from("/cache"))
        }
        async fn get_data_directory(&self) -> BridgeResult<PathBuf> {
            Ok(PathBuf::from("/data"))
        }
        async fn exists(&self, _path: &Path) -> BridgeResult<bool> {
            Ok(false)
        }
        async fn metadata(&self, _path: &Path) -> BridgeResult<FileMetadata> {
            Ok(FileMetadata {
                size: 0,
                created_at: None,
                modified_at: None,
                is_directory: false,
            })
        }
        async fn create_dir_all(&self, _path: &Path) -> BridgeResult<()> {
            Ok(())
        }
        async fn read_file(&self, _path: &Path) -> BridgeResult<Bytes> {
            Ok(Bytes::new())
        }
        async fn write_file(&self, _path: &Path, _data: Bytes) -> BridgeResult<()> {
            Ok(())
        }
        async fn delete_file(&self, _path: &Path) -> BridgeResult<()> {
            Ok(())
        }
        async fn list_directory(&self, _path: &Path) -> BridgeResult<Vec<PathBuf>> {
            Ok(Vec::new())
        }
    }

    struct StubNetwork;

    #[async_trait::async_trait]
    impl NetworkMonitor for StubNetwork {
        async fn get_network_info(&self) -> BridgeResult<NetworkInfo> {
            Ok(NetworkInfo {
                status: NetworkStatus::Connected,
                is_metered: false,
            })
        }
    }

    #[test]
    fn test_build_with_all_capabilities() {
        let config = CoreConfig::builder()
            .database_path("/tmp/library.db")
            .http_client(Arc::new(StubHttp))
            .file_system(Arc::new(StubFs))
            .network_monitor(Arc::new(StubNetwork))
            .build();

        assert!(config.is_ok());
        assert_eq!(
            config.unwrap().database_path,
            PathBuf::from("/tmp/library.db")
        );
    }

    #[test]
    fn test_build_fails_without_database_path() {
        let result = CoreConfig::builder()
            .http_client(Arc::new(StubHttp))
            .file_system(Arc::new(StubFs))
            .network_monitor(Arc::new(StubNetwork))
            .build();

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_build_fails_fast_on_missing_capability() {
        let result = CoreConfig::builder()
            .database_path("/tmp/library.db")
            .file_system(Arc::new(StubFs))
            .network_monitor(Arc::new(StubNetwork))
            .build();

        match result {
            Err(Error::CapabilityMissing { capability, .. }) => {
                assert_eq!(capability, "HttpClient");
            }
            other => panic!("expected CapabilityMissing, got {:?}", other.map(|_| ())),
        }
    }
}
