//! Agents
//!
//! - `ModelBackend`: provider stream folded into a tagged `ModelReply`
//! - `Agent`: the per-turn decision loop with optional sliding-window memory
//! - `AgentTool`: a whole agent exposed as a `{query}` tool

mod error;
mod backend;
mod runner;
mod agent_tool;
mod prompts;

pub use error::{AgentError, AgentResult};
pub use backend::{ModelBackend, ModelReply};
pub use runner::{Agent, ConversationPolicy, DEFAULT_MAX_TOOL_ROUNDS};
pub use agent_tool::{weather_assistant, AgentTool, WEATHER_ASSISTANT_TOOL};
pub use prompts::{ORCHESTRATOR_SYSTEM_PROMPT, WEATHER_SYSTEM_PROMPT};
