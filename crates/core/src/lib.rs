//! Core types and shared functionality for precache.
//!
//! This crate provides:
//! - Request/response values and request identity keys
//! - Cache storage with SQLite and in-memory backends
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod resource;

pub use cache::{CacheDb, CacheStorage, EntryInfo, MemoryStorage};
pub use config::{AppConfig, CacheConfig, ConfigError};
pub use error::Error;
pub use resource::{Request, RequestMode, Response, ResponseType};
