//! Structured errors raised by the tool layer itself.
//!
//! Cache and network failures come through `precache_core::Error`.

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Structured errors for the precache tool layer.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Invalid input parameters (e.g., empty URL).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Tool output could not be serialized.
    #[error("SERIALIZE_FAILED: {0}")]
    Serialize(String),
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let (code, message) = match &err {
            ToolError::InvalidInput(msg) => (-32602, msg.clone()),
            ToolError::Serialize(msg) => (-32603, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_code() {
        let err: McpError = ToolError::InvalidInput("url cannot be empty".into()).into();
        assert_eq!(err.code.0, -32602);
        assert_eq!(err.message, "url cannot be empty");
    }
}
