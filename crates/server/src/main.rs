//! precache server entry point.
//!
//! Boots the offline cache as a hosting runtime: install the current
//! generation, activate it, then serve fetch interception as MCP tools on
//! stdio. Logging goes to stderr to avoid interfering with the JSON-RPC
//! protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use precache_client::{ConnectivityFlag, FetchClient, FetchConfig, OfflineCache, Startup};
use precache_core::{AppConfig, CacheDb, CacheStorage, MemoryStorage};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let cache_config = config.cache_config()?;

    let storage: Arc<dyn CacheStorage> = if config.is_in_memory() {
        tracing::warn!("using in-memory cache storage; nothing will persist");
        Arc::new(MemoryStorage::new())
    } else {
        Arc::new(CacheDb::open(&config.db_path).await?)
    };

    let transport = FetchClient::new(FetchConfig {
        origin: cache_config.origin.clone(),
        user_agent: config.user_agent.clone(),
        max_bytes: config.max_bytes,
        timeout: config.timeout(),
        max_redirects: config.max_redirects,
    })?;

    let connectivity = Arc::new(ConnectivityFlag::default());
    let cache = OfflineCache::new(cache_config, storage, Arc::new(transport), connectivity.clone());

    // Interception starts only after this returns. A failed install keeps the
    // stored generations servable and is retried on the next launch.
    let startup = cache.start().await.context("cache activation failed")?;

    tracing::info!(
        origin = %cache.config().origin,
        generation = %cache.config().generation_tag,
        degraded = matches!(startup, Startup::Degraded { .. }),
        "Starting precache server on stdio transport"
    );

    let handler = handler::PrecacheServer::new(cache, connectivity);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
