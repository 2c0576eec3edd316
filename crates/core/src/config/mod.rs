//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (PRECACHE_*)
//! 2. TOML config file (if PRECACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod cache;
mod validation;

pub use cache::CacheConfig;
pub use validation::ConfigError;

/// Path value that selects the in-memory store instead of SQLite.
pub const IN_MEMORY_DB: &str = ":memory:";

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (PRECACHE_*)
/// 2. TOML config file (if PRECACHE_CONFIG_FILE set)
/// 3. Built-in defaults
///
/// List values given through the environment use TOML array syntax, e.g.
/// `PRECACHE_SEED_RESOURCES='["/", "/static/css/style.css"]'`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Origin of the application whose resources are cached.
    ///
    /// Responses from this origin are `basic`; everything else is cross-origin.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Current cache generation.
    ///
    /// Bump this to roll out a new generation; activation deletes the others.
    #[serde(default = "default_generation_tag")]
    pub generation_tag: String,

    /// Paths fetched and stored at install time.
    #[serde(default = "default_seed_resources")]
    pub seed_resources: Vec<String>,

    /// Path prefixes that are never persisted.
    #[serde(default = "default_excluded_prefixes")]
    pub excluded_prefixes: Vec<String>,

    /// Path served for failed navigations while offline.
    #[serde(default = "default_offline_placeholder")]
    pub offline_placeholder: Option<String>,

    /// Whether activation takes control of already-open clients immediately.
    #[serde(default = "default_true")]
    pub claim_clients: bool,

    /// Path to SQLite cache database, or `:memory:`.
    ///
    /// Set via PRECACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum number of redirects to follow.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

fn default_origin() -> String {
    "http://localhost:8000".into()
}

fn default_generation_tag() -> String {
    "business-permit-system-v1".into()
}

fn default_seed_resources() -> Vec<String> {
    vec!["/".into(), "/static/css/style.css".into(), "/static/js/main.js".into()]
}

fn default_excluded_prefixes() -> Vec<String> {
    vec!["/api/".into(), "/admin/".into()]
}

fn default_offline_placeholder() -> Option<String> {
    Some("/offline/".into())
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./precache.sqlite")
}

fn default_user_agent() -> String {
    "precache/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_redirects() -> usize {
    5
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            generation_tag: default_generation_tag(),
            seed_resources: default_seed_resources(),
            excluded_prefixes: default_excluded_prefixes(),
            offline_placeholder: default_offline_placeholder(),
            claim_clients: true,
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            max_redirects: default_max_redirects(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Whether the configured store lives only in memory.
    pub fn is_in_memory(&self) -> bool {
        self.db_path.as_os_str() == IN_MEMORY_DB
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `PRECACHE_`
    /// 2. TOML file from `PRECACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("PRECACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("PRECACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Build the immutable cache policy handed to the worker.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the origin is not an http(s) URL.
    pub fn cache_config(&self) -> Result<CacheConfig, ConfigError> {
        let origin = validation::parse_origin(&self.origin)?;
        Ok(CacheConfig {
            origin,
            generation_tag: self.generation_tag.clone(),
            seed_resources: self.seed_resources.clone(),
            excluded_prefixes: self.excluded_prefixes.clone(),
            offline_placeholder: self.offline_placeholder.clone(),
            claim_clients: self.claim_clients,
        })
    }
}
