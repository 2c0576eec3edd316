//! Network transport for the offline cache.
//!
//! ### URL Canonicalization
//! - Trim whitespace, ensure scheme (default: `https`)
//! - Lowercase host, remove fragments
//! - Preserve query string
//!
//! ### Response Classification
//! - Final URL on the application origin: `basic`
//! - Cross-origin under `no-cors`: `opaque` (status 0, no headers, empty body)
//! - Any other cross-origin answer: `cors`
//!
//! ### Limits
//! - Max redirects: 5 (configurable)
//! - Max body bytes: 5MB (configurable)
//! - Non-2xx statuses are returned as responses, not errors

pub mod url;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Method};
use std::time::{Duration, Instant};

pub use self::url::{UrlError, canonicalize, resolve, resolve_input};

use precache_core::{Error, Request, RequestMode, Response, ResponseType};

/// Issues live requests on behalf of the worker.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` and return whatever the server answered.
    ///
    /// Errors only when no response could be obtained.
    async fn send(&self, request: &Request) -> Result<Response, Error>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Application origin used to tell same-origin from cross-origin responses.
    pub origin: ::url::Url,

    /// User agent string (default: "precache/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl FetchConfig {
    /// Limits at their defaults for the given application origin.
    pub fn new(origin: ::url::Url) -> Self {
        Self {
            origin,
            user_agent: "precache/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

/// HTTP transport backed by reqwest.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn is_same_origin(&self, url: &::url::Url) -> bool {
        url.origin() == self.config.origin.origin()
    }

    fn classify(&self, request: &Request, final_url: &::url::Url) -> ResponseType {
        if self.is_same_origin(final_url) {
            ResponseType::Basic
        } else if request.mode == RequestMode::NoCors {
            ResponseType::Opaque
        } else {
            ResponseType::Cors
        }
    }
}

fn map_send_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::FetchTimeout(err.to_string())
    } else {
        Error::Network(err.to_string())
    }
}

#[async_trait]
impl Transport for FetchClient {
    async fn send(&self, request: &Request) -> Result<Response, Error> {
        let start = Instant::now();

        if request.mode == RequestMode::SameOrigin && !self.is_same_origin(&request.url) {
            return Err(Error::Network(format!("cross-origin request in same-origin mode: {}", request.url)));
        }

        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| Error::InvalidInput(format!("unsupported method: {}", request.method)))?;

        let mut builder = self.http.request(method, request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(map_send_error)?;

        let status = response.status();
        let final_url = response.url().clone();
        let response_type = self.classify(request, &final_url);

        if response_type == ResponseType::Opaque {
            tracing::debug!(url = %request.url, "opaque cross-origin response");
            return Ok(Response {
                url: final_url.to_string(),
                status: 0,
                status_text: String::new(),
                headers: Vec::new(),
                body: Bytes::new(),
                response_type,
            });
        }

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!(
                "{} bytes exceeds {}",
                len, self.config.max_bytes
            )));
        }

        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();

        let body = response.bytes().await.map_err(map_send_error)?;

        if body.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!(
                "{} bytes exceeds {}",
                body.len(),
                self.config.max_bytes
            )));
        }

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            "fetched {} {} -> {} {} in {}ms ({} bytes)",
            request.method,
            request.url,
            final_url,
            status.as_u16(),
            fetch_ms,
            body.len()
        );

        Ok(Response {
            url: final_url.to_string(),
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
            response_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> FetchClient {
        let config = FetchConfig::new(::url::Url::parse("https://permits.example.gov").unwrap());
        FetchClient::new(config).unwrap()
    }

    #[test]
    fn test_fetch_config_defaults() {
        let config = FetchConfig::new(::url::Url::parse("http://localhost:8000").unwrap());
        assert_eq!(config.origin.as_str(), "http://localhost:8000/");
        assert_eq!(config.user_agent, "precache/0.1");
        assert_eq!(config.max_bytes, 5 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_millis(20000));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_classify_same_origin_is_basic() {
        let client = client();
        let url = ::url::Url::parse("https://permits.example.gov/static/js/main.js").unwrap();
        let request = Request::get(url.clone()).with_mode(RequestMode::NoCors);
        assert_eq!(client.classify(&request, &url), ResponseType::Basic);
    }

    #[test]
    fn test_classify_cross_origin() {
        let client = client();
        let url = ::url::Url::parse("https://cdn.example.com/lib.js").unwrap();

        let no_cors = Request::get(url.clone()).with_mode(RequestMode::NoCors);
        assert_eq!(client.classify(&no_cors, &url), ResponseType::Opaque);

        let cors = Request::get(url.clone());
        assert_eq!(client.classify(&cors, &url), ResponseType::Cors);
    }

    #[tokio::test]
    async fn test_same_origin_mode_rejects_cross_origin() {
        let client = client();
        let request = Request::get(::url::Url::parse("https://cdn.example.com/lib.js").unwrap())
            .with_mode(RequestMode::SameOrigin);
        let err = client.send(&request).await.unwrap_err();
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn test_fetch_client_new() {
        let client = FetchClient::new(FetchConfig::new(::url::Url::parse("http://localhost:8000").unwrap()));
        assert!(client.is_ok());
    }
}
