//! External tool source errors

use thiserror::Error;

/// Errors raised by an external tool source
#[derive(Error, Debug)]
pub enum McpError {
    /// The server process could not be spawned or went away
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The protocol handshake failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// The server returned something we cannot use (e.g. a malformed tool list)
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Tool call '{tool}' timed out after {secs}s")]
    Timeout { tool: String, secs: u64 },

    /// The server ran the tool and reported a failure
    #[error("Remote execution failed: {0}")]
    RemoteExecution(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl McpError {
    /// Whether the session is no longer usable after this error
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            McpError::ConnectionFailed(_) | McpError::InitializationFailed(_) | McpError::Io(_)
        )
    }
}

pub type McpResult<T> = Result<T, McpError>;
