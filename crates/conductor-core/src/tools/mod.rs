//! Tool management module
//!
//! Tools reach the model through one `ToolRegistry`, whatever their origin:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  ToolRegistry                                │
//! │                                              │
//! │  local:  http_request, shell,                │
//! │          weather_assistant (sub-agent)       │
//! │  mcp:    tools listed by the spawned server  │
//! │                                              │
//! │  - name -> handler, exact match              │
//! │  - local names win over discovered ones      │
//! │  - errors come back as error results         │
//! └──────────────────────────────────────────────┘
//!           │
//!           │ tools/list, tools/call (stdio)
//!           ▼
//! ┌──────────────────────────────────────────────┐
//! │  External tool server (child process)        │
//! └──────────────────────────────────────────────┘
//! ```

mod handler;
mod registry;
mod mcp_tool;
mod http;
mod shell;

pub use handler::{required_str, ToolError, ToolHandler, ToolOutcome};
pub use registry::{ToolFilter, ToolInfo, ToolRegistry, LOCAL_SOURCE};
pub use mcp_tool::McpToolHandler;
pub use http::{truncate_body, HttpRequestTool, HTTP_REQUEST_TOOL};
pub use shell::{ShellTool, SHELL_TOOL};
