//! Immutable cache policy.

use url::Url;

/// Cache policy shared by every worker handler.
///
/// Built once from [`AppConfig`](super::AppConfig) and never mutated, so
/// concurrent fetch interceptions all see the same rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Origin the cached application is served from.
    pub origin: Url,
    /// Name of the current generation's store.
    pub generation_tag: String,
    /// Paths stored at install, in order.
    pub seed_resources: Vec<String>,
    /// Path prefixes never persisted.
    pub excluded_prefixes: Vec<String>,
    /// Fallback for offline navigations.
    pub offline_placeholder: Option<String>,
    /// Take control of open clients right after activation.
    pub claim_clients: bool,
}

impl CacheConfig {
    /// Policy for `origin` with the given generation and no seeds, exclusions or placeholder.
    pub fn new(origin: Url, generation_tag: impl Into<String>) -> Self {
        Self {
            origin,
            generation_tag: generation_tag.into(),
            seed_resources: Vec::new(),
            excluded_prefixes: Vec::new(),
            offline_placeholder: None,
            claim_clients: true,
        }
    }

    pub fn with_seeds<I, S>(mut self, seeds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.seed_resources = seeds.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_excluded<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_offline_placeholder(mut self, path: impl Into<String>) -> Self {
        self.offline_placeholder = Some(path.into());
        self
    }

    /// Whether `url` shares scheme, host and port with the configured origin.
    pub fn is_same_origin(&self, url: &Url) -> bool {
        url.origin() == self.origin.origin()
    }

    /// Whether the path of `url` falls under an excluded prefix.
    pub fn is_excluded(&self, url: &Url) -> bool {
        let path = url.path();
        self.excluded_prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CacheConfig {
        CacheConfig::new(Url::parse("https://permits.example.gov").unwrap(), "v1").with_excluded(["/api/", "/admin/"])
    }

    #[test]
    fn test_same_origin() {
        let cfg = config();
        assert!(cfg.is_same_origin(&Url::parse("https://permits.example.gov/static/x.css").unwrap()));
        assert!(!cfg.is_same_origin(&Url::parse("http://permits.example.gov/").unwrap()));
        assert!(!cfg.is_same_origin(&Url::parse("https://cdn.example.com/x.js").unwrap()));
    }

    #[test]
    fn test_excluded_prefixes() {
        let cfg = config();
        assert!(cfg.is_excluded(&Url::parse("https://permits.example.gov/api/documents/1").unwrap()));
        assert!(cfg.is_excluded(&Url::parse("https://permits.example.gov/admin/").unwrap()));
        assert!(!cfg.is_excluded(&Url::parse("https://permits.example.gov/apiary").unwrap()));
        assert!(!cfg.is_excluded(&Url::parse("https://permits.example.gov/").unwrap()));
    }
}
