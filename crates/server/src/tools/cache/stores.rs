//! cache_stores tool implementation.
//!
//! Lists cache generations with their entry counts.

use precache_client::OfflineCache;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Summary of one store.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StoreSummary {
    pub name: String,
    pub current: bool,
    pub entries: usize,
    pub body_bytes: u64,
}

/// Output from the cache_stores tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStoresOutput {
    /// Current generation tag.
    pub generation: String,
    pub stores: Vec<StoreSummary>,
}

/// Implementation of the cache_stores tool.
pub async fn stores_impl(cache: &OfflineCache) -> Result<CallToolResult, McpError> {
    let storage = cache.storage();
    let generation = cache.config().generation_tag.clone();

    let mut stores = Vec::new();
    for name in storage.names().await? {
        let entries = storage.entries(&name).await?;
        let current = name == generation;
        stores.push(StoreSummary {
            name,
            current,
            entries: entries.len(),
            body_bytes: entries.iter().map(|e| e.body_bytes).sum(),
        });
    }

    json_result(&CacheStoresOutput { generation, stores })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{installed_cache, parse_output};

    #[tokio::test]
    async fn test_stores_after_activation() {
        let (cache, _) = installed_cache().await;

        let output: CacheStoresOutput = parse_output(&stores_impl(&cache).await.unwrap());
        assert_eq!(output.generation, "v1");
        assert_eq!(output.stores.len(), 1);
        assert!(output.stores[0].current);
        assert_eq!(output.stores[0].entries, 2);
        assert_eq!(output.stores[0].body_bytes, ("<h1>Dashboard</h1>".len() + "<h1>Offline</h1>".len()) as u64);
    }
}
