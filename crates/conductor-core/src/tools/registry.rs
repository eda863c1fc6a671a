//! Tool registry for model tool calling
//!
//! The ToolRegistry is the central component for:
//! - Holding local tools and tools discovered from an external source
//! - Filtering tools based on configuration
//! - Providing tool definitions to the model
//! - Executing tool calls and returning results
//!
//! Lookup is exact and case-sensitive. Local tools take precedence: a
//! discovered tool whose name is already taken is skipped.

use std::collections::HashSet;
use std::sync::Arc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::logging::Logger;
use crate::mcp::{McpResult, ToolSource};
use crate::types::{Tool, ToolCall, ToolResult};

use super::handler::{ToolError, ToolHandler};
use super::mcp_tool::McpToolHandler;

/// Source label for tools defined in this process
pub const LOCAL_SOURCE: &str = "local";

/// Information about a tool with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name
    pub name: String,
    /// Tool description
    pub description: String,
    /// JSON Schema for tool parameters
    pub input_schema: Value,
    /// Whether this tool is offered to the model
    pub enabled: bool,
    /// Source of this tool (`local` or `mcp:<server>`)
    pub source: String,
}

impl ToolInfo {
    fn from_definition(tool: Tool, source: impl Into<String>) -> Self {
        Self {
            name: tool.name,
            description: tool.description,
            input_schema: tool
                .input_schema
                .unwrap_or_else(|| serde_json::json!({ "type": "object", "properties": {} })),
            enabled: true,
            source: source.into(),
        }
    }
}

impl From<&ToolInfo> for Tool {
    fn from(info: &ToolInfo) -> Self {
        Tool {
            name: info.name.clone(),
            description: info.description.clone(),
            input_schema: Some(info.input_schema.clone()),
        }
    }
}

/// Filter for tool listing
#[derive(Debug, Clone, Default)]
pub struct ToolFilter {
    /// If set, only include tools with these names
    pub include: Option<HashSet<String>>,
    /// Exclude tools with these names
    pub exclude: HashSet<String>,
    /// If set, only include tools from this source
    pub source: Option<String>,
    /// Only include enabled tools
    pub only_enabled: bool,
}

impl ToolFilter {
    pub fn new() -> Self {
        Self {
            include: None,
            exclude: HashSet::new(),
            source: None,
            only_enabled: true,
        }
    }

    /// Include all tools
    pub fn all() -> Self {
        Self {
            only_enabled: false,
            ..Self::new()
        }
    }

    /// Include only specific tools
    pub fn with_include(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.include = Some(names.into_iter().collect());
        self
    }

    /// Exclude specific tools
    pub fn with_exclude(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.exclude = names.into_iter().collect();
        self
    }

    /// Only tools from one source
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Check if a tool matches this filter
    pub fn matches(&self, tool: &ToolInfo) -> bool {
        if self.only_enabled && !tool.enabled {
            return false;
        }

        if self.exclude.contains(&tool.name) {
            return false;
        }

        if let Some(ref include) = self.include {
            if !include.contains(&tool.name) {
                return false;
            }
        }

        if let Some(ref source) = self.source {
            if &tool.source != source {
                return false;
            }
        }

        true
    }
}

struct Entry {
    info: ToolInfo,
    handler: Arc<dyn ToolHandler>,
}

/// Tool registry for managing available tools
pub struct ToolRegistry {
    /// Registration order is the order tools are offered to the model
    tools: RwLock<Vec<Entry>>,
    logger: Arc<dyn Logger>,
}

impl ToolRegistry {
    /// Create an empty tool registry
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            tools: RwLock::new(Vec::new()),
            logger,
        }
    }

    /// Register a locally defined tool
    pub fn register(&self, handler: Arc<dyn ToolHandler>) -> Result<(), ToolError> {
        self.insert(handler, LOCAL_SOURCE)
    }

    fn insert(&self, handler: Arc<dyn ToolHandler>, source: &str) -> Result<(), ToolError> {
        let info = ToolInfo::from_definition(handler.definition(), source);
        let mut tools = self.tools.write();
        if tools.iter().any(|e| e.info.name == info.name) {
            return Err(ToolError::Duplicate(info.name));
        }
        self.logger.debug(&format!(
            "[ToolRegistry] Registered '{}' from {}",
            info.name, info.source
        ));
        tools.push(Entry { info, handler });
        Ok(())
    }

    /// Add tools discovered from an external source
    ///
    /// Returns the names that were skipped because they were already taken.
    pub fn merge_discovered(&self, source: &Arc<dyn ToolSource>, tools: Vec<Tool>) -> Vec<String> {
        let label = format!("mcp:{}", source.name());
        let mut skipped = Vec::new();

        for tool in tools {
            let name = tool.name.clone();
            let handler = Arc::new(McpToolHandler::new(tool, Arc::clone(source)));
            if self.insert(handler, &label).is_err() {
                self.logger.warn(&format!(
                    "[ToolRegistry] Skipping discovered tool '{}' from {}: name already registered",
                    name, label
                ));
                skipped.push(name);
            }
        }

        skipped
    }

    /// List tools from `source` and merge them
    pub async fn discover(&self, source: &Arc<dyn ToolSource>) -> McpResult<Vec<String>> {
        let tools = source.list_tools().await?;
        self.logger.info(&format!(
            "[ToolRegistry] Discovered {} tools from {}",
            tools.len(),
            source.name()
        ));
        Ok(self.merge_discovered(source, tools))
    }

    /// Get tools matching a filter
    pub fn get_tools(&self, filter: &ToolFilter) -> Vec<ToolInfo> {
        self.tools
            .read()
            .iter()
            .filter(|e| filter.matches(&e.info))
            .map(|e| e.info.clone())
            .collect()
    }

    /// Get tool definitions for the model (enabled only)
    pub fn llm_tools(&self) -> Vec<Tool> {
        self.get_tools(&ToolFilter::new())
            .iter()
            .map(Tool::from)
            .collect()
    }

    /// Enable or disable a tool
    pub fn set_tool_enabled(&self, name: &str, enabled: bool) {
        let mut tools = self.tools.write();
        if let Some(entry) = tools.iter_mut().find(|e| e.info.name == name) {
            entry.info.enabled = enabled;
        }
    }

    /// Whether an enabled tool with exactly this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    fn lookup(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.tools
            .read()
            .iter()
            .find(|e| e.info.enabled && e.info.name == name)
            .map(|e| Arc::clone(&e.handler))
    }

    /// Invoke a tool by name
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<String, ToolError> {
        let handler = self
            .lookup(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        self.logger.info(&format!("[ToolRegistry] Calling tool: {}", name));
        handler.invoke(arguments).await
    }

    /// Execute a tool call from a model response
    ///
    /// Never fails: every error becomes an error result for the model.
    pub async fn execute_tool_call(&self, tool_call: &ToolCall) -> ToolResult {
        match self.call_tool(&tool_call.name, tool_call.input.clone()).await {
            Ok(text) => ToolResult::success(&tool_call.id, text),
            Err(e) => {
                self.logger.warn(&format!(
                    "[ToolRegistry] Tool '{}' failed: {}",
                    tool_call.name, e
                ));
                ToolResult::error(&tool_call.id, format!("Error: {}", e))
            }
        }
    }

    /// Execute tool calls one at a time, in the order given
    pub async fn execute_tool_calls(&self, tool_calls: &[ToolCall]) -> Vec<ToolResult> {
        let mut results = Vec::with_capacity(tool_calls.len());

        for call in tool_calls {
            results.push(self.execute_tool_call(call).await);
        }

        results
    }

    /// Get count of registered tools
    pub fn tool_count(&self) -> usize {
        self.tools.read().len()
    }

    /// Get count of enabled tools
    pub fn enabled_tool_count(&self) -> usize {
        self.get_tools(&ToolFilter::new()).len()
    }
}
