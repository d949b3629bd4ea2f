//! Network Monitoring Abstraction
//!
//! Provides network connectivity information so the core can defer remote
//! work while offline.

use async_trait::async_trait;

use crate::error::Result;

/// Network connection status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    /// Connected to network
    Connected,
    /// Not connected to any network
    Disconnected,
    /// Connection status unknown or indeterminate
    Indeterminate,
}

/// Network information
#[derive(Debug, Clone)]
pub struct NetworkInfo {
    pub status: NetworkStatus,
    /// Whether the connection is metered (has data limits/costs)
    pub is_metered: bool,
}

/// Network monitor trait
///
/// Allows the core to:
/// - Fall back to cached library state when offline
/// - Skip best-effort remote progress updates without connectivity
///
/// # Example
///
/// ```ignore
/// use bridge_traits::network::NetworkMonitor;
///
/// async fn should_sync(monitor: &dyn NetworkMonitor) -> bool {
///     monitor.is_connected().await
/// }
/// ```
#[async_trait]
pub trait NetworkMonitor: Send + Sync {
    /// Get current network information
    async fn get_network_info(&self) -> Result<NetworkInfo>;

    /// Check if currently connected to any network
    async fn is_connected(&self) -> bool {
        matches!(
            self.get_network_info().await,
            Ok(NetworkInfo {
                status: NetworkStatus::Connected,
                ..
            })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedMonitor(NetworkStatus);

    #[async_trait]
    impl NetworkMonitor for FixedMonitor {
        async fn get_network_info(&self) -> Result<NetworkInfo> {
            Ok(NetworkInfo {
                status: self.0,
                is_metered: false,
            })
        }
    }

    #[tokio::test]
    async fn test_is_connected_default() {
        assert!(FixedMonitor(NetworkStatus::Connected).is_connected().await);
        assert!(!FixedMonitor(NetworkStatus::Disconnected).is_connected().await);
        assert!(!FixedMonitor(NetworkStatus::Indeterminate).is_connected().await);
    }
}
