//! Client code for precache.
//!
//! This crate provides the network transport, the connectivity signal, and
//! the offline cache worker that ties them to a [`CacheStorage`].
//!
//! [`CacheStorage`]: precache_core::CacheStorage

pub mod connectivity;
pub mod fetch;
pub mod worker;

pub use connectivity::{AlwaysOnline, Connectivity, ConnectivityFlag};
pub use fetch::{FetchClient, FetchConfig, Transport};
pub use worker::{ActivateReport, Eligibility, FetchSource, Fetched, InstallReport, OfflineCache, Startup};
