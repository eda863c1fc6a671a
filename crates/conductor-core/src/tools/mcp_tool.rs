//! Tool handler backed by an external tool source

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::mcp::ToolSource;
use crate::types::Tool;

use super::handler::{ToolHandler, ToolOutcome};

/// Forwards invocations of one discovered tool to its source
pub struct McpToolHandler {
    definition: Tool,
    source: Arc<dyn ToolSource>,
}

impl McpToolHandler {
    pub fn new(definition: Tool, source: Arc<dyn ToolSource>) -> Self {
        Self { definition, source }
    }
}

#[async_trait]
impl ToolHandler for McpToolHandler {
    fn definition(&self) -> Tool {
        self.definition.clone()
    }

    async fn invoke(&self, input: Value) -> ToolOutcome {
        Ok(self.source.call_tool(&self.definition.name, input).await?)
    }
}
