//! Network Monitoring Implementation

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    network::{NetworkInfo, NetworkMonitor, NetworkStatus},
};
use tracing::debug;

/// Desktop network monitor implementation
///
/// Provides basic network connectivity detection via a TCP probe.
///
/// Note: Platform-specific implementations (Linux netlink, macOS
/// SystemConfiguration, Windows WinAPI) would be more robust but require
/// additional dependencies.
pub struct DesktopNetworkMonitor {
    probe_addr: String,
}

impl DesktopNetworkMonitor {
    /// Create a new network monitor
    pub fn new() -> Self {
        Self {
            probe_addr: "8.8.8.8:53".to_string(),
        }
    }

    /// Create a monitor probing a custom address (useful for testing)
    pub fn with_probe_addr(probe_addr: impl Into<String>) -> Self {
        Self {
            probe_addr: probe_addr.into(),
        }
    }

    /// Check network connectivity by attempting a TCP connection
    async fn check_connectivity(&self) -> NetworkStatus {
        match tokio::time::timeout(
            std::time::Duration::from_secs(5),
            tokio::net::TcpStream::connect(&self.probe_addr),
        )
        .await
        {
            Ok(Ok(_)) => NetworkStatus::Connected,
            Ok(Err(_)) => NetworkStatus::Disconnected,
            Err(_) => NetworkStatus::Disconnected,
        }
    }
}

impl Default for DesktopNetworkMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NetworkMonitor for DesktopNetworkMonitor {
    async fn get_network_info(&self) -> Result<NetworkInfo> {
        let status = self.check_connectivity().await;
        debug!(status = ?status, "Network info updated");

        Ok(NetworkInfo {
            status,
            // Desktop connections are typically not metered
            is_metered: false,
        })
    }
}
