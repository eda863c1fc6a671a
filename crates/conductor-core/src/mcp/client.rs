//! MCP client using the official rmcp SDK
//!
//! Spawns the tool server as a child process and talks to it over stdio.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use rmcp::{
    model::{
        CallToolRequestParams, CallToolResult, ClientCapabilities, ClientInfo, Implementation,
        RawContent, Tool as McpTool,
    },
    service::{Peer, RunningService, ServiceError},
    transport::TokioChildProcess,
    RoleClient, ServiceExt,
};
use serde_json::Value;
use tokio::process::Command;

use crate::config::{Credentials, McpServerSettings};
use crate::logging::Logger;
use crate::types::Tool;

use super::error::{McpError, McpResult};
use super::source::ToolSource;

/// MCP client bound to one spawned server process
pub struct McpClient {
    name: String,
    peer: Peer<RoleClient>,
    /// Present until the session is shut down
    service: Mutex<Option<RunningService<RoleClient, ClientInfo>>>,
    /// Names from the last successful listing; `None` before the first one
    known_tools: RwLock<Option<HashSet<String>>>,
    call_timeout: Duration,
    logger: Arc<dyn Logger>,
}

impl McpClient {
    /// Spawn the server and perform the protocol handshake
    ///
    /// The child environment is built by `server_command`.
    pub async fn spawn(
        settings: &McpServerSettings,
        credentials: &Credentials,
        call_timeout: Duration,
        logger: Arc<dyn Logger>,
    ) -> McpResult<Self> {
        logger.info(&format!(
            "[McpClient] Spawning '{}': {} {}",
            settings.name,
            settings.command,
            settings.args.join(" ")
        ));

        let transport = TokioChildProcess::new(server_command(settings, credentials)).map_err(|e| {
            McpError::ConnectionFailed(format!("failed to spawn '{}': {}", settings.command, e))
        })?;

        let service = client_info()
            .serve(transport)
            .await
            .map_err(|e| McpError::InitializationFailed(e.to_string()))?;

        if let Some(info) = service.peer_info() {
            logger.info(&format!(
                "[McpClient] Connected to {} {}",
                info.server_info.name, info.server_info.version
            ));
        }

        Ok(Self {
            name: settings.name.clone(),
            peer: service.peer().clone(),
            service: Mutex::new(Some(service)),
            known_tools: RwLock::new(None),
            call_timeout,
            logger,
        })
    }

    fn ensure_open(&self) -> McpResult<()> {
        if self.service.lock().is_none() {
            return Err(McpError::ConnectionFailed("session is closed".to_string()));
        }
        Ok(())
    }
}

/// Command line for the server with an isolated environment
///
/// Only `PATH` is inherited, so the executable can still be located; every
/// other variable the child sees is a forwarded credential.
pub fn server_command(settings: &McpServerSettings, credentials: &Credentials) -> Command {
    let mut cmd = Command::new(&settings.command);
    cmd.args(&settings.args).env_clear().kill_on_drop(true);
    if let Some(path) = std::env::var_os("PATH") {
        cmd.env("PATH", path);
    }
    for (key, value) in credentials.vars() {
        cmd.env(key, value);
    }
    cmd
}

fn client_info() -> ClientInfo {
    ClientInfo {
        meta: None,
        protocol_version: Default::default(),
        capabilities: ClientCapabilities::default(),
        client_info: Implementation {
            name: "conductor".to_string(),
            title: Some("Conductor".to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            website_url: None,
            icons: None,
        },
    }
}

/// Map an rmcp service error onto the tool source taxonomy
fn map_service_error(tool: &str, timeout: Duration, err: ServiceError) -> McpError {
    match err {
        ServiceError::McpError(data) => McpError::RemoteExecution(data.message.to_string()),
        ServiceError::Timeout { .. } => McpError::Timeout {
            tool: tool.to_string(),
            secs: timeout.as_secs(),
        },
        ServiceError::UnexpectedResponse => McpError::Protocol(unexpected_response(tool)),
        other => McpError::ConnectionFailed(other.to_string()),
    }
}

fn unexpected_response(request: &str) -> String {
    format!("unexpected response to '{}'", request)
}

/// Map a failed `tools/list` round-trip
///
/// A reply the server got wrong is a protocol error; anything that kept the
/// reply from arriving is a connection error.
fn map_listing_error(err: ServiceError) -> McpError {
    match err {
        ServiceError::McpError(data) => McpError::Protocol(data.message.to_string()),
        ServiceError::UnexpectedResponse => McpError::Protocol(unexpected_response("tools/list")),
        other => McpError::ConnectionFailed(other.to_string()),
    }
}

/// Convert a discovered rmcp tool into a tool definition
pub fn to_tool(tool: &McpTool) -> Tool {
    Tool::new(
        tool.name.to_string(),
        tool.description.as_deref().unwrap_or_default(),
    )
    .with_schema(Value::Object(tool.input_schema.as_ref().clone()))
}

/// Reject listings the registry cannot hold: blank or repeated names
pub fn validate_listing(tools: &[Tool]) -> McpResult<()> {
    let mut seen = HashSet::new();
    for tool in tools {
        if tool.name.trim().is_empty() {
            return Err(McpError::Protocol("tool listing contains an unnamed tool".to_string()));
        }
        if !seen.insert(tool.name.as_str()) {
            return Err(McpError::Protocol(format!(
                "tool listing contains '{}' more than once",
                tool.name
            )));
        }
    }
    Ok(())
}

/// Join the text blocks of a tool result
pub fn result_text(result: &CallToolResult) -> String {
    result
        .content
        .iter()
        .filter_map(|c| match &c.raw {
            RawContent::Text(t) => Some(t.text.clone()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl ToolSource for McpClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_tools(&self) -> McpResult<Vec<Tool>> {
        self.ensure_open()?;

        let result = self
            .peer
            .list_tools(Default::default())
            .await
            .map_err(map_listing_error)?;

        let tools: Vec<Tool> = result.tools.iter().map(to_tool).collect();
        validate_listing(&tools)?;

        self.logger.info(&format!("[McpClient] Listed {} tools", tools.len()));

        *self.known_tools.write() = Some(tools.iter().map(|t| t.name.clone()).collect());
        Ok(tools)
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<String> {
        self.ensure_open()?;

        if let Some(known) = self.known_tools.read().as_ref() {
            if !known.contains(name) {
                return Err(McpError::ToolNotFound(name.to_string()));
            }
        }

        self.logger.info(&format!("[McpClient] Calling tool: {}", name));

        let params = CallToolRequestParams {
            meta: None,
            name: name.to_owned().into(),
            arguments: arguments.as_object().cloned(),
            task: None,
        };

        let result = tokio::time::timeout(self.call_timeout, self.peer.call_tool(params))
            .await
            .map_err(|_| McpError::Timeout {
                tool: name.to_string(),
                secs: self.call_timeout.as_secs(),
            })?
            .map_err(|e| map_service_error(name, self.call_timeout, e))?;

        let text = result_text(&result);
        if result.is_error.unwrap_or(false) {
            return Err(McpError::RemoteExecution(text));
        }
        Ok(text)
    }

    async fn shutdown(&self) -> McpResult<()> {
        let service = self.service.lock().take();
        let Some(service) = service else {
            return Ok(());
        };

        self.logger.info(&format!("[McpClient] Closing session '{}'", self.name));
        service
            .cancel()
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use serde_json::json;

    #[test]
    fn test_validate_listing() {
        let ok = vec![Tool::new("echo", "Echo"), Tool::new("greet", "Greet")];
        assert!(validate_listing(&ok).is_ok());
        assert!(validate_listing(&[]).is_ok());

        let dup = vec![Tool::new("echo", "Echo"), Tool::new("echo", "Echo again")];
        assert!(matches!(validate_listing(&dup), Err(McpError::Protocol(_))));

        let blank = vec![Tool::new("  ", "Nameless")];
        assert!(matches!(validate_listing(&blank), Err(McpError::Protocol(_))));
    }

    #[test]
    fn test_to_tool_keeps_schema() {
        let mcp_tool: McpTool = serde_json::from_value(json!({
            "name": "calculate_area",
            "description": "Area of a rectangle",
            "inputSchema": {
                "type": "object",
                "properties": { "width": { "type": "number" }, "height": { "type": "number" } }
            }
        }))
        .unwrap();

        let tool = to_tool(&mcp_tool);
        assert_eq!(tool.name, "calculate_area");
        assert_eq!(tool.description, "Area of a rectangle");
        assert_eq!(tool.input_schema.unwrap()["properties"]["width"]["type"], "number");
    }

    #[test]
    fn test_result_text_joins_text_blocks() {
        let result: CallToolResult = serde_json::from_value(json!({
            "content": [
                { "type": "text", "text": "first" },
                { "type": "text", "text": "second" }
            ],
            "isError": false
        }))
        .unwrap();
        assert_eq!(result_text(&result), "first\nsecond");
    }

    #[test]
    fn test_listing_error_mapping() {
        assert!(matches!(
            map_listing_error(ServiceError::UnexpectedResponse),
            McpError::Protocol(_)
        ));
        assert!(matches!(
            map_listing_error(ServiceError::McpError(rmcp::model::ErrorData::internal_error("bad schema", None))),
            McpError::Protocol(ref m) if m == "bad schema"
        ));
        assert!(matches!(
            map_listing_error(ServiceError::TransportClosed),
            McpError::ConnectionFailed(_)
        ));
    }

    #[test]
    fn test_call_error_mapping() {
        let timeout = Duration::from_secs(60);
        assert!(matches!(
            map_service_error("echo", timeout, ServiceError::UnexpectedResponse),
            McpError::Protocol(_)
        ));
        assert!(matches!(
            map_service_error("echo", timeout, ServiceError::Timeout { timeout }),
            McpError::Timeout { secs: 60, .. }
        ));
        assert!(matches!(
            map_service_error("echo", timeout, ServiceError::TransportClosed),
            McpError::ConnectionFailed(_)
        ));
    }

    #[test]
    fn test_server_command_isolates_environment() {
        std::env::set_var("CONDUCTOR_TEST_PARENT_ONLY", "leak");

        let settings = McpServerSettings {
            command: "node".to_string(),
            args: vec!["mcp-server.js".to_string()],
            ..Default::default()
        };
        let credentials = Credentials::new(vec![
            ("API_KEY".to_string(), "key-1".to_string()),
            ("SHUTTERSTOCK_API_TOKEN".to_string(), "token-2".to_string()),
        ]);
        let cmd = server_command(&settings, &credentials);

        let mut envs: Vec<(String, Option<String>)> = cmd
            .as_std()
            .get_envs()
            .map(|(k, v)| {
                (
                    k.to_string_lossy().into_owned(),
                    v.map(|v| v.to_string_lossy().into_owned()),
                )
            })
            .collect();
        envs.sort();

        let names: Vec<&str> = envs.iter().map(|(k, _)| k.as_str()).collect();
        let mut expected = vec!["API_KEY", "SHUTTERSTOCK_API_TOKEN"];
        if std::env::var_os("PATH").is_some() {
            expected.insert(0, "PATH");
        }
        expected.sort();
        assert_eq!(names, expected);
        assert!(!names.contains(&"CONDUCTOR_TEST_PARENT_ONLY"));

        let value = |name: &str| envs.iter().find(|(k, _)| k == name).and_then(|(_, v)| v.clone());
        assert_eq!(value("API_KEY").as_deref(), Some("key-1"));
        assert_eq!(value("SHUTTERSTOCK_API_TOKEN").as_deref(), Some("token-2"));

        let args: Vec<_> = cmd.as_std().get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, vec!["mcp-server.js"]);

        std::env::remove_var("CONDUCTOR_TEST_PARENT_ONLY");
    }

    #[tokio::test]
    async fn test_spawn_missing_executable_fails() {
        let settings = McpServerSettings {
            command: "/nonexistent/conductor-test-server".to_string(),
            args: vec![],
            ..Default::default()
        };
        let result = McpClient::spawn(
            &settings,
            &Credentials::default(),
            Duration::from_secs(1),
            Arc::new(NoOpLogger),
        )
        .await;
        assert!(result.is_err());
    }
}
