//! # Synchronization Module
//!
//! Reconciles the local book library with the remote catalog.
//!
//! ## Overview
//!
//! The [`BookService`](service::BookService) is the single entry point for
//! hosts: it serves the library offline-first, merges the remote catalog when
//! reachable, imports manual books, and records reading progress locally
//! before pushing it upstream. The remote catalog and document parser are
//! abstract collaborators defined in [`catalog`].

pub mod catalog;
pub mod error;
pub mod service;

pub use catalog::{DocumentParser, RemoteBook, RemoteCatalog};
pub use error::{Result, SyncError};
pub use service::{BookService, RemoteUpdateStatus, CACHE_TTL_DAYS};
