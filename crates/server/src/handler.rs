//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::{
    CacheGetParams, ConnectivitySetParams, ResourceFetchParams, connectivity_impl, fetch_impl, get_impl, stores_impl,
};

use precache_client::{ConnectivityFlag, OfflineCache};
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for precache.
///
/// Constructed only after install and activation have completed, so every
/// tool call sees the current generation.
#[derive(Clone)]
pub struct PrecacheServer {
    cache: OfflineCache,
    connectivity: Arc<ConnectivityFlag>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl PrecacheServer {
    /// Create a new server handler.
    pub fn new(cache: OfflineCache, connectivity: Arc<ConnectivityFlag>) -> Self {
        Self { cache, connectivity, tool_router: Self::tool_router() }
    }

    /// Fetch a resource through the offline cache.
    #[tool(
        description = "Fetch a resource cache-first. Misses go to the network and eligible same-origin 200 responses are stored. Offline navigations fall back to the offline page."
    )]
    async fn resource_fetch(&self, params: Parameters<ResourceFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.cache, params.0).await
    }

    /// Look up a stored entry.
    #[tool(description = "Show metadata for the stored response matching a URL, without touching the network.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.cache, params.0).await
    }

    /// List cache generations.
    #[tool(description = "List cache stores (generations) with entry counts and sizes.")]
    async fn cache_stores(&self) -> Result<CallToolResult, McpError> {
        stores_impl(&self.cache).await
    }

    /// Report a connectivity change.
    #[tool(description = "Set whether the client is online. While offline, failed navigations get the offline page.")]
    async fn connectivity_set(&self, params: Parameters<ConnectivitySetParams>) -> Result<CallToolResult, McpError> {
        connectivity_impl(&self.connectivity, params.0)
    }
}

impl ServerHandler for PrecacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "precache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::installed_cache;

    #[tokio::test]
    async fn test_router_lists_all_tools() {
        let (cache, connectivity) = installed_cache().await;
        let server = PrecacheServer::new(cache, connectivity);

        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();
        assert_eq!(names, vec!["cache_get", "cache_stores", "connectivity_set", "resource_fetch"]);
    }

    #[tokio::test]
    async fn test_server_info() {
        let (cache, connectivity) = installed_cache().await;
        let info = PrecacheServer::new(cache, connectivity).get_info();
        assert_eq!(info.server_info.name, "precache");
        assert!(info.capabilities.tools.is_some());
    }
}
