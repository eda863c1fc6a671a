//! Tool source abstraction

use async_trait::async_trait;
use serde_json::Value;

use crate::types::Tool;

use super::error::McpResult;

/// An out-of-process provider of tools
///
/// Calls are only valid while the session is open; `shutdown` ends it and must
/// be safe to call more than once.
#[async_trait]
pub trait ToolSource: Send + Sync {
    /// Label used in logs and as the registry source
    fn name(&self) -> &str;

    /// Discover the tools the source currently offers
    async fn list_tools(&self) -> McpResult<Vec<Tool>>;

    /// Invoke one tool and return its textual output
    async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<String>;

    /// Tear down the session (process and channel)
    async fn shutdown(&self) -> McpResult<()>;
}
