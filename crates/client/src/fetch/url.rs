//! URL canonicalization and resolution against the application origin.

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("path must start with '/': {0}")]
    RelativePath(String),
}

/// Canonicalize a URL string so equal resources produce equal request keys.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Default scheme to https:// if missing
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn canonicalize(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let url_str = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };

    let mut parsed = url::Url::parse(&url_str).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(mut host) = parsed.host_str() {
        let h = host.to_lowercase();
        host = h.as_str();
        parsed
            .set_host(Some(host))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Resolve an absolute path (`/static/css/style.css`) against `origin`.
pub fn resolve(origin: &url::Url, path: &str) -> Result<url::Url, UrlError> {
    let path = path.trim();
    if !path.starts_with('/') {
        return Err(UrlError::RelativePath(path.to_string()));
    }
    let joined = origin.join(path).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    canonicalize(joined.as_str())
}

/// Accept either an absolute path on `origin` or a full URL.
pub fn resolve_input(origin: &url::Url, input: &str) -> Result<url::Url, UrlError> {
    if input.trim_start().starts_with('/') { resolve(origin, input) } else { canonicalize(input) }
}
