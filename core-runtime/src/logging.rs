//! # Logging & Tracing Infrastructure
//!
//! Configures the `tracing-subscriber` stack used by every core crate:
//! - Pretty, compact, or JSON output formats
//! - Module-level filtering via `RUST_LOG` or a configured default directive
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
//!
//! let config = LoggingConfig::default()
//!     .with_format(LogFormat::Compact)
//!     .with_directive("info,core_sync=debug");
//! init_logging(config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

use crate::error::{Error, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable pretty format with colors
    Pretty,
    /// Structured JSON format for machine parsing
    Json,
    /// Compact format for production
    Compact,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Output format
    pub format: LogFormat,
    /// Default filter directive, overridden by `RUST_LOG` when set
    pub default_directive: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            default_directive: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.default_directive = directive.into();
        self
    }
}

/// Initialize the global tracing subscriber
///
/// # Errors
///
/// Returns an error when a global subscriber is already installed.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_directive));

    let result = match config.format {
        LogFormat::Pretty => fmt().with_env_filter(filter).pretty().try_init(),
        LogFormat::Json => fmt().with_env_filter(filter).json().try_init(),
        LogFormat::Compact => fmt().with_env_filter(filter).compact().try_init(),
    };

    result.map_err(|e| Error::Internal(format!("Failed to set tracing subscriber: {}", e)))
}
