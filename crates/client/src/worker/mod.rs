//! Offline resource cache worker.
//!
//! Three handlers driven by the hosting runtime, in lifecycle order:
//!
//! 1. [`OfflineCache::on_install`] seeds the current generation's store.
//! 2. [`OfflineCache::on_activate`] deletes every other generation.
//! 3. [`OfflineCache::on_fetch`] answers requests cache-first, falling back to
//!    the network and persisting eligible responses as it goes.
//!
//! Every storage read/write and network request is an await point. Concurrent
//! fetches share nothing except the storage, whose operations are atomic per
//! key; a fetch that is dropped mid-flight may or may not finish its write.

pub mod policy;

use std::sync::Arc;

use precache_core::{CacheConfig, CacheStorage, Error, Request, Response};

use crate::connectivity::Connectivity;
use crate::fetch::{Transport, resolve};

pub use policy::{Eligibility, RequestClass, classify, eligibility};

/// Where an intercepted request's response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    /// A stored response; the network was not consulted.
    Cache,
    /// A live response.
    Network,
    /// The offline placeholder, served for a failed navigation.
    OfflinePlaceholder,
}

impl FetchSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchSource::Cache => "cache",
            FetchSource::Network => "network",
            FetchSource::OfflinePlaceholder => "offline",
        }
    }
}

/// Result of one fetch interception.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub response: Response,
    pub source: FetchSource,
    /// Whether a copy was written to the current store.
    pub stored: bool,
}

/// Outcome of a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub store: String,
    pub seeded: usize,
}

/// Outcome of an activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivateReport {
    pub current: String,
    /// Stale generations removed, in the order they were found.
    pub deleted: Vec<String>,
    /// Whether the runtime may take over open clients without a reload.
    pub claim_clients: bool,
}

/// How the hosting runtime came up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Startup {
    /// The current generation is seeded and older ones are gone.
    Activated { install: InstallReport, activate: ActivateReport },
    /// Install failed. Nothing was pruned; existing stores keep serving.
    Degraded { reason: String },
}

/// Cache-first interception over a storage, a transport and a connectivity signal.
#[derive(Clone)]
pub struct OfflineCache {
    config: Arc<CacheConfig>,
    storage: Arc<dyn CacheStorage>,
    transport: Arc<dyn Transport>,
    connectivity: Arc<dyn Connectivity>,
}

impl OfflineCache {
    pub fn new(
        config: CacheConfig, storage: Arc<dyn CacheStorage>, transport: Arc<dyn Transport>,
        connectivity: Arc<dyn Connectivity>,
    ) -> Self {
        Self { config: Arc::new(config), storage, transport, connectivity }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    /// Seed the current generation's store.
    ///
    /// All seed resources are fetched before anything is written, so a failed
    /// install leaves no half-seeded entries behind. Other generations are
    /// never touched.
    ///
    /// # Errors
    ///
    /// Returns `Error::InstallFailed` if any seed cannot be fetched, answers
    /// with a non-2xx status, or the store write fails.
    pub async fn on_install(&self) -> Result<InstallReport, Error> {
        let tag = &self.config.generation_tag;
        self.storage
            .open(tag)
            .await
            .map_err(|e| Error::InstallFailed(format!("open store {tag}: {e}")))?;

        let mut entries = Vec::with_capacity(self.config.seed_resources.len());
        for path in &self.config.seed_resources {
            let url = resolve(&self.config.origin, path)
                .map_err(|e| Error::InstallFailed(format!("{path}: {e}")))?;
            let request = Request::get(url);
            let response = self
                .transport
                .send(&request)
                .await
                .map_err(|e| Error::InstallFailed(format!("{path}: {e}")))?;
            if !response.ok() {
                return Err(Error::InstallFailed(format!("{path}: status {}", response.status)));
            }
            entries.push((request, response));
        }

        self.storage
            .put_all(tag, &entries)
            .await
            .map_err(|e| Error::InstallFailed(format!("write store {tag}: {e}")))?;

        tracing::info!(store = %tag, seeded = entries.len(), "cache generation installed");

        Ok(InstallReport { store: tag.clone(), seeded: entries.len() })
    }

    /// Delete every store except the current generation.
    ///
    /// Running it again with no install in between deletes nothing.
    pub async fn on_activate(&self) -> Result<ActivateReport, Error> {
        let current = &self.config.generation_tag;
        let mut deleted = Vec::new();

        for name in self.storage.names().await? {
            if &name == current {
                continue;
            }
            if self.storage.delete(&name).await? {
                tracing::debug!(store = %name, "deleted stale cache generation");
                deleted.push(name);
            }
        }

        tracing::info!(
            current = %current,
            deleted = deleted.len(),
            claim_clients = self.config.claim_clients,
            "cache generation activated"
        );

        Ok(ActivateReport { current: current.clone(), deleted, claim_clients: self.config.claim_clients })
    }

    /// Install then activate, the order a hosting runtime must follow before
    /// intercepting fetches.
    ///
    /// An install failure is not fatal here: activation is skipped so every
    /// previously cached generation stays matchable, and the next start
    /// retries the install.
    pub async fn start(&self) -> Result<Startup, Error> {
        match self.on_install().await {
            Ok(install) => {
                let activate = self.on_activate().await?;
                Ok(Startup::Activated { install, activate })
            }
            Err(e) => {
                tracing::warn!(
                    generation = %self.config.generation_tag,
                    error = %e,
                    "install failed; serving previously cached generations"
                );
                Ok(Startup::Degraded { reason: e.to_string() })
            }
        }
    }

    /// Answer `request`, returning only the response.
    pub async fn on_fetch(&self, request: &Request) -> Result<Response, Error> {
        self.handle_fetch(request).await.map(|f| f.response)
    }

    /// Answer `request` and report where the response came from.
    ///
    /// # Errors
    ///
    /// Returns the transport's error when the network fails and no offline
    /// placeholder applies.
    pub async fn handle_fetch(&self, request: &Request) -> Result<Fetched, Error> {
        if request.is_get() {
            match self.storage.match_any(request).await {
                Ok(Some(response)) => {
                    tracing::debug!("cache hit for {}", request.url);
                    return Ok(Fetched { response, source: FetchSource::Cache, stored: false });
                }
                Ok(None) => tracing::debug!("cache miss for {}", request.url),
                Err(e) => tracing::warn!(url = %request.url, error = %e, "cache lookup failed; using network"),
            }
        }

        match self.transport.send(request).await {
            Ok(response) => {
                let stored = self.persist(request, &response).await;
                Ok(Fetched { response, source: FetchSource::Network, stored })
            }
            Err(err) => {
                if err.is_network()
                    && request.is_navigation()
                    && !self.connectivity.is_online()
                    && let Some(response) = self.offline_placeholder().await
                {
                    tracing::debug!(url = %request.url, "offline; serving placeholder");
                    return Ok(Fetched { response, source: FetchSource::OfflinePlaceholder, stored: false });
                }
                Err(err)
            }
        }
    }

    /// Store a copy of `response` if eligible. Failures are logged, not returned.
    async fn persist(&self, request: &Request, response: &Response) -> bool {
        let decision = eligibility(&self.config, request, response);
        if !decision.is_eligible() {
            tracing::debug!(url = %request.url, ?decision, "not persisting response");
            return false;
        }

        let copy = response.duplicate();
        match self.storage.put(&self.config.generation_tag, request, &copy).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "failed to persist response");
                false
            }
        }
    }

    async fn offline_placeholder(&self) -> Option<Response> {
        let path = self.config.offline_placeholder.as_deref()?;
        let url = resolve(&self.config.origin, path).ok()?;
        match self.storage.match_any(&Request::get(url)).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(error = %e, "offline placeholder lookup failed");
                None
            }
        }
    }
}
