//! shell tool
//!
//! Runs a command via `sh -c` with a timeout. Registered only when
//! `tools.shell.enabled` is set.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::process::Command;

use crate::config::ShellToolSettings;
use crate::types::Tool;

use super::handler::{required_str, ToolError, ToolHandler, ToolOutcome};

pub const SHELL_TOOL: &str = "shell";

/// Executes shell commands on the local machine
pub struct ShellTool {
    timeout: Duration,
}

impl ShellTool {
    pub fn new(settings: &ShellToolSettings) -> Self {
        Self {
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }
}

#[async_trait]
impl ToolHandler for ShellTool {
    fn definition(&self) -> Tool {
        Tool::new(
            SHELL_TOOL,
            "Run a shell command and return its exit status, stdout and stderr.",
        )
        .with_schema(json!({
            "type": "object",
            "properties": {
                "command": { "type": "string", "description": "Command line passed to sh -c" }
            },
            "required": ["command"]
        }))
    }

    async fn invoke(&self, input: Value) -> ToolOutcome {
        let command = required_str(&input, "command")?;

        let child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ToolError::Other(format!("failed to start sh: {}", e)))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ToolError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| ToolError::Other(e.to_string()))?;

        let status = output
            .status
            .code()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "terminated by signal".to_string());

        Ok(format!(
            "Exit status: {}\n\nstdout:\n{}\n\nstderr:\n{}",
            status,
            String::from_utf8_lossy(&output.stdout).trim_end(),
            String::from_utf8_lossy(&output.stderr).trim_end()
        ))
    }
}
