//! Core types for agent interactions
//!
//! This module contains the shared types used by providers, tools and agents.

mod message;
mod tool;
mod stream;
mod cancellation;

pub use message::{ChatMessage, ContentPart, MessageRole, MessageContent};
pub use tool::{Tool, ToolCall, ToolResult};
pub use stream::StreamChunk;
pub use cancellation::CancellationToken;
