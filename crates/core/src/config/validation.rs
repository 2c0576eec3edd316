//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;
use url::Url;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

pub(crate) fn parse_origin(origin: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(origin)
        .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })?;
    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(ConfigError::Invalid {
                field: "origin".into(),
                reason: format!("unsupported scheme: {scheme}"),
            });
        }
    }
    if url.host_str().is_none() {
        return Err(ConfigError::Invalid { field: "origin".into(), reason: "must have a host".into() });
    }
    Ok(url)
}

fn require_absolute_path(field: &str, path: &str) -> Result<(), ConfigError> {
    if !path.starts_with('/') {
        return Err(ConfigError::Invalid { field: field.into(), reason: format!("'{path}' must start with '/'") });
    }
    Ok(())
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `origin` is not an http(s) URL with a host
    /// - `generation_tag` is empty
    /// - a seed resource, excluded prefix or the offline placeholder is not an absolute path
    /// - the offline placeholder falls under an excluded prefix
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_origin(&self.origin)?;

        if self.generation_tag.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "generation_tag".into(),
                hint: "Set PRECACHE_GENERATION_TAG environment variable".into(),
            });
        }

        for seed in &self.seed_resources {
            require_absolute_path("seed_resources", seed)?;
        }
        for prefix in &self.excluded_prefixes {
            require_absolute_path("excluded_prefixes", prefix)?;
        }

        if let Some(placeholder) = &self.offline_placeholder {
            require_absolute_path("offline_placeholder", placeholder)?;
            if self.excluded_prefixes.iter().any(|p| placeholder.starts_with(p.as_str())) {
                return Err(ConfigError::Invalid {
                    field: "offline_placeholder".into(),
                    reason: "must not fall under an excluded prefix".into(),
                });
            }
            if !self.seed_resources.iter().any(|s| s == placeholder) {
                tracing::warn!(
                    placeholder = %placeholder,
                    "offline_placeholder is not in seed_resources; it is only served once visited online"
                );
            }
        }

        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 50MB".into() });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_origin_scheme() {
        let config = AppConfig { origin: "ftp://example.com".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "origin"));
    }

    #[test]
    fn test_validate_empty_generation_tag() {
        let config = AppConfig { generation_tag: "  ".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Missing { field, .. }) if field == "generation_tag"));
    }

    #[test]
    fn test_validate_relative_seed() {
        let config = AppConfig { seed_resources: vec!["static/app.js".into()], ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "seed_resources"));
    }

    #[test]
    fn test_validate_relative_prefix() {
        let config = AppConfig { excluded_prefixes: vec!["api/".into()], ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "excluded_prefixes"));
    }

    #[test]
    fn test_validate_excluded_placeholder() {
        let config = AppConfig { offline_placeholder: Some("/api/offline".into()), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "offline_placeholder"));
    }

    #[test]
    fn test_validate_no_placeholder() {
        let config = AppConfig { offline_placeholder: None, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_max_bytes_zero() {
        let config = AppConfig { max_bytes: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "max_bytes"));
    }

    #[test]
    fn test_validate_timeout_bounds() {
        let config = AppConfig { timeout_ms: 50, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));

        let config = AppConfig { timeout_ms: 301_000, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));

        let config = AppConfig { timeout_ms: 100, max_bytes: 1, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_user_agent() {
        let config = AppConfig { user_agent: String::new(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "user_agent"));
    }
}
