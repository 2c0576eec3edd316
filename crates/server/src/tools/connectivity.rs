//! connectivity_set tool implementation.
//!
//! Lets the client report link changes; offline navigations then fall back to
//! the cached placeholder.

use precache_client::{Connectivity, ConnectivityFlag};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Parameters for the connectivity_set tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConnectivitySetParams {
    pub online: bool,
}

/// Output from the connectivity_set tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConnectivitySetOutput {
    pub online: bool,
    pub previous: bool,
}

/// Implementation of the connectivity_set tool.
pub fn connectivity_impl(flag: &ConnectivityFlag, params: ConnectivitySetParams) -> Result<CallToolResult, McpError> {
    let previous = flag.set_online(params.online);
    json_result(&ConnectivitySetOutput { online: flag.is_online(), previous })
}
