//! Workspace facade crate.
//!
//! This crate exists so host applications can depend on `bpc-workspace` and
//! reach every core crate (`core-library`, `core-cache`, `core-sync`,
//! `core-runtime`) through a single dependency instead of wiring each
//! workspace member individually.

pub use core_cache as cache;
pub use core_library as library;
pub use core_runtime as runtime;
pub use core_sync as sync;
