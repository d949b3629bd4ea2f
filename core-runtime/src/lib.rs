//! # Core Runtime Module
//!
//! Ambient infrastructure shared by the core crates:
//!
//! - **Logging** (`logging`): `tracing`/`tracing-subscriber` setup with
//!   configurable format and filtering
//! - **Configuration** (`config`): the [`CoreConfig`](config::CoreConfig)
//!   builder that wires bridge implementations into the core with fail-fast
//!   validation

pub mod config;
pub mod error;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder};
pub use error::{Error, Result};
pub use logging::{init_logging, LogFormat, LoggingConfig};
