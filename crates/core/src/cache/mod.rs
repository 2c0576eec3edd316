//! Named response stores for offline caching.
//!
//! This module provides the [`CacheStorage`] abstraction and two backends:
//!
//! - [`CacheDb`]: SQLite via tokio-rusqlite, WAL mode, schema migrations
//! - [`MemoryStorage`]: process-local, for tests and throwaway runs
//!
//! Entries are keyed by request identity (SHA-256 of method + URL). One
//! store exists per cache generation; deleting a store drops its entries.

pub mod connection;
pub mod entries;
pub mod hash;
pub mod memory;
pub mod migrations;
pub mod storage;
pub mod stores;

pub use crate::Error;

pub use connection::CacheDb;
pub use memory::MemoryStorage;
pub use storage::{CacheStorage, EntryInfo};
