//! Storage abstraction and implementations for gymtrack.
//!
//! This crate provides the repository trait the services consume, an
//! in-memory implementation and, behind the `sqlite` feature, a SQLite one.

#![warn(missing_docs)]

pub mod trait_;
pub mod memory_storage;
#[cfg(feature = "sqlite")]
pub mod sqlite_storage;

pub use trait_::{Storage, StorageError, Result};
pub use memory_storage::MemoryStorage;
#[cfg(feature = "sqlite")]
pub use sqlite_storage::SqliteStorage;
