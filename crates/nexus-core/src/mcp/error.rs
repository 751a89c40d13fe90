//! Remote tool protocol errors

use thiserror::Error;

/// JSON-RPC "method not found"
pub const METHOD_NOT_FOUND: i64 = -32601;
/// JSON-RPC "invalid request"
pub const INVALID_REQUEST: i64 = -32600;

#[derive(Error, Debug)]
pub enum McpError {
    /// Spawning or talking to the subprocess failed
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The server answered with a JSON-RPC error object
    #[error("RPC error {code}: {message}")]
    Protocol { code: i64, message: String },

    #[error("Request '{method}' timed out after {timeout_ms}ms")]
    Timeout { method: String, timeout_ms: u64 },

    #[error("MCP server '{0}' exited")]
    ServerExited(String),

    #[error("MCP server '{0}' not started")]
    NotStarted(String),

    #[error("MCP server not configured: {0}")]
    UnknownServer(String),

    #[error("MCP server not connected: {0}")]
    NotConnected(String),

    #[error("MCP server '{0}' does not support tool invocation")]
    Unsupported(String),

    #[error("Invalid MCP server config: {0}")]
    InvalidConfig(String),
}

impl McpError {
    /// Whether the server rejected the method name itself, so another
    /// candidate method may be tried
    pub fn is_method_not_found(&self) -> bool {
        matches!(self, McpError::Protocol { code, .. } if *code == METHOD_NOT_FOUND || *code == INVALID_REQUEST)
    }
}

pub type McpResult<T> = Result<T, McpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_not_found() {
        let err = McpError::Protocol { code: METHOD_NOT_FOUND, message: "no such method".into() };
        assert!(err.is_method_not_found());
        let err = McpError::Protocol { code: -32000, message: "tool failed".into() };
        assert!(!err.is_method_not_found());
        assert!(!McpError::ServerExited("fs".into()).is_method_not_found());
    }
}
