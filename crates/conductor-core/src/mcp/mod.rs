//! External tool sources over MCP (Model Context Protocol)
//!
//! Uses the official rmcp SDK. The tool server is spawned as a child process
//! and reached over stdio; `scoped` guarantees it is shut down exactly once.
//!
//! # Example
//!
//! ```rust,ignore
//! use conductor_core::mcp::{scoped, McpClient, ToolSource};
//!
//! let client = McpClient::spawn(&settings.mcp_server, &settings.credentials, timeout, logger.clone()).await?;
//! scoped(Arc::new(client), logger, |source| async move {
//!     let tools = source.list_tools().await?;
//!     source.call_tool("echo", json!({ "text": "hi" })).await
//! }).await?;
//! ```

mod error;
mod source;
mod client;
mod session;

pub use error::{McpError, McpResult};
pub use source::ToolSource;
pub use client::{result_text, server_command, to_tool, validate_listing, McpClient};
pub use session::{scoped, SessionGuard};
