//! Cache inspection MCP tools.
//!
//! Read-only views over the stores behind the offline cache.

pub mod get;
pub mod stores;

pub use get::{CacheGetParams, get_impl};
pub use stores::stores_impl;
