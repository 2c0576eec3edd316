//! resource_fetch tool implementation.
//!
//! Runs one request through the offline cache: cache first, then network,
//! then the offline placeholder for navigations.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use precache_client::{OfflineCache, fetch::resolve_input};
use precache_core::{Error, Request, RequestMode};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::error::ToolError;

/// Input parameters for resource_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResourceFetchParams {
    /// Absolute path on the application origin (`/documents/`) or a full URL.
    pub url: String,

    /// HTTP method (default: GET). Only GET is served from or written to the cache.
    #[serde(default = "default_method")]
    pub method: String,

    /// Treat the request as a page navigation (enables the offline placeholder).
    #[serde(default)]
    pub navigate: bool,

    /// Request mode for subresources; ignored when `navigate` is set.
    #[serde(default)]
    pub mode: RequestMode,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for resource_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResourceFetchOutput {
    /// Request URL after canonicalization.
    pub url: String,
    /// `cache`, `network` or `offline`.
    pub source: String,
    /// Whether the response was written to the current generation.
    pub stored: bool,
    pub status: u16,
    pub status_text: String,
    /// `basic`, `cors` or `opaque`.
    pub response_type: String,
    pub headers: Vec<(String, String)>,
    pub body_bytes: usize,
    /// Body as text when it is valid UTF-8.
    pub body_text: Option<String>,
    /// Body as base64 otherwise.
    pub body_base64: Option<String>,
}

/// Implementation of the resource_fetch tool.
pub async fn fetch_impl(cache: &OfflineCache, params: ResourceFetchParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(ToolError::InvalidInput("url cannot be empty".into()).into());
    }
    if params.method.trim().is_empty() {
        return Err(ToolError::InvalidInput("method cannot be empty".into()).into());
    }

    let url = resolve_input(&cache.config().origin, &params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let mode = if params.navigate { RequestMode::Navigate } else { params.mode };
    let request = Request::get(url).with_method(params.method.trim()).with_mode(mode);

    let fetched = cache.handle_fetch(&request).await?;
    let response = &fetched.response;

    let (body_text, body_base64) = match response.text() {
        Some(text) => (Some(text.to_string()), None),
        None => (None, Some(BASE64.encode(&response.body))),
    };

    let output = ResourceFetchOutput {
        url: request.url.to_string(),
        source: fetched.source.as_str().to_string(),
        stored: fetched.stored,
        status: response.status,
        status_text: response.status_text.clone(),
        response_type: response.response_type.as_str().to_string(),
        headers: response.headers.clone(),
        body_bytes: response.body.len(),
        body_text,
        body_base64,
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{installed_cache, parse_output};

    fn params(url: &str) -> ResourceFetchParams {
        ResourceFetchParams { url: url.into(), method: default_method(), navigate: false, mode: RequestMode::default() }
    }

    #[tokio::test]
    async fn test_fetch_seeded_from_cache() {
        let (cache, _) = installed_cache().await;
        let result = fetch_impl(&cache, params("/")).await.unwrap();
        let output: ResourceFetchOutput = parse_output(&result);
        assert_eq!(output.source, "cache");
        assert_eq!(output.body_text.as_deref(), Some("<h1>Dashboard</h1>"));
        assert_eq!(output.url, "http://localhost:8000/");
    }

    #[tokio::test]
    async fn test_fetch_miss_is_stored() {
        let (cache, _) = installed_cache().await;
        let output: ResourceFetchOutput = parse_output(&fetch_impl(&cache, params("/documents/")).await.unwrap());
        assert_eq!(output.source, "network");
        assert!(output.stored);
        assert_eq!(output.response_type, "basic");
    }

    #[tokio::test]
    async fn test_fetch_excluded_not_stored() {
        let (cache, _) = installed_cache().await;
        let output: ResourceFetchOutput =
            parse_output(&fetch_impl(&cache, params("/api/documents/")).await.unwrap());
        assert_eq!(output.source, "network");
        assert!(!output.stored);
    }

    #[tokio::test]
    async fn test_fetch_binary_body_base64() {
        let (cache, _) = installed_cache().await;
        let output: ResourceFetchOutput =
            parse_output(&fetch_impl(&cache, params("/static/img/logo.bin")).await.unwrap());
        assert!(output.body_text.is_none());
        let decoded = BASE64.decode(output.body_base64.unwrap()).unwrap();
        assert_eq!(decoded, b"\x89PNG\xff\xfe");
    }

    #[tokio::test]
    async fn test_offline_navigation_placeholder() {
        let (cache, connectivity) = installed_cache().await;
        connectivity.set_online(false);

        let p = ResourceFetchParams { navigate: true, ..params("/documents/9/") };
        let output: ResourceFetchOutput = parse_output(&fetch_impl(&cache, p).await.unwrap());
        assert_eq!(output.source, "offline");
        assert_eq!(output.body_text.as_deref(), Some("<h1>Offline</h1>"));
    }

    #[tokio::test]
    async fn test_fetch_empty_url() {
        let (cache, _) = installed_cache().await;
        assert!(fetch_impl(&cache, params("  ")).await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_unreachable_surfaces_error() {
        let (cache, _) = installed_cache().await;
        let err = fetch_impl(&cache, params("/nowhere/")).await.unwrap_err();
        assert_eq!(err.code.0, -32004);
    }
}
