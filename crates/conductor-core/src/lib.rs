//! Conductor Core
//!
//! Agent orchestration: a top-level agent that answers directly or delegates
//! to tools, including a nested sub-agent and tools discovered from an
//! external MCP server.
//! The crate is runtime-agnostic about where input comes from; the CLI crate
//! wires it to a terminal.
//!
//! ## Tool Orchestration
//!
//! The `tools` module keeps local and discovered tools behind one registry:
//! - Register local tools (HTTP, shell, sub-agents)
//! - Merge tools listed by an external server (local names win)
//! - Execute tool calls and return results to the model
//!
//! ```rust,ignore
//! use conductor_core::tools::ToolRegistry;
//!
//! let registry = ToolRegistry::new(logger);
//! registry.register(Arc::new(HttpRequestTool::new(&settings.tools.http)?))?;
//! registry.discover(&source).await?;
//!
//! // Tools for the model
//! let tools = registry.llm_tools();
//!
//! // Execute tool calls from a model reply
//! let results = registry.execute_tool_calls(&tool_calls).await;
//! ```

pub mod types;
pub mod secrets;
pub mod logging;
pub mod config;
pub mod providers;
pub mod mcp;
pub mod tools;
pub mod memory;
pub mod agent;
pub mod shell;
pub mod app;

// Re-export commonly used types
pub use types::{
    ChatMessage, ContentPart, MessageRole, MessageContent,
    Tool, ToolCall, ToolResult,
    StreamChunk,
    CancellationToken,
};

pub use secrets::{SecretStore, SecretStoreError, SecretStoreResult, EnvSecretStore, MemorySecretStore};

pub use logging::{Logger, NoOpLogger, TracingLogger};

pub use config::{ConfigError, ConfigFile, ConfigResult, Settings};

pub use providers::{create_provider, Provider, ProviderError, ProviderResult};

pub use mcp::{scoped, McpClient, McpError, McpResult, ToolSource};

pub use tools::{ToolError, ToolFilter, ToolHandler, ToolInfo, ToolRegistry};

pub use memory::ConversationWindow;

pub use agent::{Agent, AgentError, AgentResult, AgentTool, ConversationPolicy, ModelBackend, ModelReply};

pub use shell::{Shell, ShellExit, TurnHandler};

pub use app::{App, AppError, AppResult};
