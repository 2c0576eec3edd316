//! cache_get tool implementation.
//!
//! Retrieves metadata for the stored response matching a request.

use precache_client::{OfflineCache, fetch::resolve_input};
use precache_core::{EntryInfo, Error, Request};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Absolute path on the application origin or a full URL.
    pub url: String,

    /// HTTP method the entry was stored under (default: GET).
    #[serde(default)]
    pub method: Option<String>,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    /// The stored entry.
    pub entry: EntryInfo,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(cache: &OfflineCache, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let url = resolve_input(&cache.config().origin, &params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let mut request = Request::get(url);
    if let Some(method) = params.method.as_deref() {
        request = request.with_method(method);
    }

    let entry = cache
        .storage()
        .lookup(&request)
        .await?
        .ok_or_else(|| Error::CacheMiss(format!("{} {}", request.method, request.url)))?;

    json_result(&CacheGetOutput { entry })
}
