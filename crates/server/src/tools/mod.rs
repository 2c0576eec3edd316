//! MCP tool implementations.
//!
//! This module contains all tools exposed by the precache server.

pub mod cache;
pub mod connectivity;
pub mod resource_fetch;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use crate::error::ToolError;

pub use cache::{CacheGetParams, get_impl, stores_impl};
pub use connectivity::{ConnectivitySetParams, connectivity_impl};
pub use resource_fetch::{ResourceFetchParams, fetch_impl};

/// Wrap a tool's output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(|e| ToolError::Serialize(e.to_string()))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use bytes::Bytes;
    use precache_client::{ConnectivityFlag, OfflineCache, Transport};
    use precache_core::{CacheConfig, Error, MemoryStorage, Request, Response, ResponseType};
    use rmcp::model::CallToolResult;
    use serde::de::DeserializeOwned;
    use url::Url;

    pub const ORIGIN: &str = "http://localhost:8000";

    /// Serves fixed same-origin pages; anything else is unreachable.
    pub struct StubTransport {
        pages: HashMap<String, (u16, &'static [u8])>,
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn send(&self, request: &Request) -> Result<Response, Error> {
            let (status, body) = self
                .pages
                .get(request.url.as_str())
                .copied()
                .ok_or_else(|| Error::Network(format!("unreachable: {}", request.url)))?;
            Ok(Response {
                url: request.url.to_string(),
                status,
                status_text: String::new(),
                headers: vec![("content-type".into(), "text/html".into())],
                body: Bytes::from_static(body),
                response_type: ResponseType::Basic,
            })
        }
    }

    /// An installed and activated cache over a small fake site.
    pub async fn installed_cache() -> (OfflineCache, Arc<ConnectivityFlag>) {
        let origin = Url::parse(ORIGIN).unwrap();
        let pages: [(&str, u16, &'static [u8]); 5] = [
            ("/", 200, b"<h1>Dashboard</h1>"),
            ("/offline/", 200, b"<h1>Offline</h1>"),
            ("/documents/", 200, b"<ul></ul>"),
            ("/api/documents/", 200, b"[]"),
            ("/static/img/logo.bin", 200, b"\x89PNG\xff\xfe"),
        ];
        let pages = pages
            .into_iter()
            .map(|(path, status, body)| (origin.join(path).unwrap().to_string(), (status, body)))
            .collect();

        let config = CacheConfig::new(origin, "v1")
            .with_seeds(["/", "/offline/"])
            .with_excluded(["/api/", "/admin/"])
            .with_offline_placeholder("/offline/");
        let connectivity = Arc::new(ConnectivityFlag::default());
        let cache = OfflineCache::new(
            config,
            Arc::new(MemoryStorage::new()),
            Arc::new(StubTransport { pages }),
            connectivity.clone(),
        );
        cache.on_install().await.unwrap();
        cache.on_activate().await.unwrap();
        (cache, connectivity)
    }

    /// Parse the JSON text of a tool result's first content item.
    pub fn parse_output<T: DeserializeOwned>(result: &CallToolResult) -> T {
        let content_val = serde_json::to_value(&result.content[0]).unwrap();
        let text = content_val
            .get("text")
            .and_then(|v| v.as_str())
            .expect("Expected text field in content");
        serde_json::from_str(text).unwrap()
    }
}
