//! Tool handler trait and errors

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::mcp::McpError;
use crate::types::Tool;

/// Errors raised while invoking a tool
///
/// These never abort a turn: the registry turns them into error results that
/// are fed back to the model.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Timed out after {0}s")]
    Timeout(u64),

    #[error("Remote execution failed: {0}")]
    RemoteExecution(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Tool '{0}' is already registered")]
    Duplicate(String),

    #[error("{0}")]
    Other(String),
}

impl From<McpError> for ToolError {
    fn from(err: McpError) -> Self {
        match err {
            McpError::ToolNotFound(name) => ToolError::NotFound(name),
            McpError::Timeout { secs, .. } => ToolError::Timeout(secs),
            McpError::RemoteExecution(msg) => ToolError::RemoteExecution(msg),
            McpError::Protocol(msg) => ToolError::Other(format!("Protocol error: {}", msg)),
            other => ToolError::Connection(other.to_string()),
        }
    }
}

pub type ToolOutcome = Result<String, ToolError>;

/// A callable tool: a definition advertised to the model plus an invoke fn
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Name, description and input schema
    fn definition(&self) -> Tool;

    /// Run the tool with the model-supplied arguments
    async fn invoke(&self, input: Value) -> ToolOutcome;
}

/// Pull a required string argument out of a tool input object
pub fn required_str<'a>(input: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    input
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ToolError::InvalidInput(format!("missing string field '{}'", key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mcp_error_mapping() {
        assert!(matches!(
            ToolError::from(McpError::ToolNotFound("x".into())),
            ToolError::NotFound(ref n) if n == "x"
        ));
        assert!(matches!(
            ToolError::from(McpError::Timeout { tool: "x".into(), secs: 60 }),
            ToolError::Timeout(60)
        ));
        assert!(matches!(
            ToolError::from(McpError::RemoteExecution("bad".into())),
            ToolError::RemoteExecution(_)
        ));
        assert!(matches!(
            ToolError::from(McpError::ConnectionFailed("gone".into())),
            ToolError::Connection(_)
        ));
    }

    #[test]
    fn test_required_str() {
        let input = json!({"query": "Seattle, WA", "blank": "  ", "n": 3});
        assert_eq!(required_str(&input, "query").unwrap(), "Seattle, WA");
        assert!(required_str(&input, "blank").is_err());
        assert!(required_str(&input, "n").is_err());
        assert!(required_str(&input, "missing").is_err());
    }
}
