//! File-based configuration (YAML)
//!
//! Default location is `<user config dir>/conductor/config.yaml`
//! (`~/.config/conductor/config.yaml` on Linux). A missing file means defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ConfigResult};

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ConfigFile {
    /// Model backend selection and sampling parameters
    pub model: ModelSettings,
    /// External tool server launch parameters
    pub mcp_server: McpServerSettings,
    /// Conversation memory and tool-chain bounds
    pub conversation: ConversationSettings,
    /// Locally defined tools
    pub tools: ToolSettings,
}

/// Model backend settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Provider name (openai, anthropic, gemini, ollama, ...)
    pub provider: String,
    /// Model identifier as used by the provider's API
    pub model: String,
    /// Custom API base URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Maximum tokens to generate per model call
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_base: None,
            max_tokens: 512,
            temperature: 0.5,
        }
    }
}

/// External tool server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct McpServerSettings {
    /// Name used in logs and as the tool source label
    pub name: String,
    /// Executable to spawn
    pub command: String,
    /// Arguments passed to the executable
    pub args: Vec<String>,
    /// Credential variables forwarded to the server; all are required
    pub forward_env: Vec<String>,
    /// Per-call timeout in seconds
    pub call_timeout_secs: u64,
}

impl Default for McpServerSettings {
    fn default() -> Self {
        Self {
            name: "mcp-server-node".to_string(),
            command: "node".to_string(),
            args: vec!["mcp-server.js".to_string()],
            forward_env: vec!["API_KEY".to_string(), "SHUTTERSTOCK_API_TOKEN".to_string()],
            call_timeout_secs: 60,
        }
    }
}

/// Conversation memory settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationSettings {
    /// Number of most recent messages kept by the orchestrator
    pub window_size: usize,
    /// Maximum model rounds ending in tool calls within one user turn
    pub max_tool_rounds: usize,
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            window_size: 20,
            max_tool_rounds: 8,
        }
    }
}

/// Local tool settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ToolSettings {
    pub http: HttpToolSettings,
    pub shell: ShellToolSettings,
    /// Tool names hidden from the orchestrator
    pub disabled: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpToolSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub max_response_bytes: usize,
}

impl Default for HttpToolSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: format!("conductor/{} (agent demo)", env!("CARGO_PKG_VERSION")),
            max_response_bytes: 64 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellToolSettings {
    pub enabled: bool,
    pub timeout_secs: u64,
}

impl Default for ShellToolSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout_secs: 30,
        }
    }
}

impl ConfigFile {
    /// Default config file path for the current user
    pub fn user_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
        config_dir.join("conductor").join("config.yaml")
    }

    /// Load a config file, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content).map_err(|message| ConfigError::Parse {
            path: path.display().to_string(),
            message,
        })
    }

    /// Parse YAML content; an empty document yields defaults
    pub fn parse(content: &str) -> Result<Self, String> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| e.to_string())
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> ConfigResult<String> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::Invalid(format!("Failed to serialize YAML: {}", e)))
    }

    /// Reject values the runtime cannot honour
    pub fn validate(&self) -> ConfigResult<()> {
        if self.conversation.window_size == 0 {
            return Err(ConfigError::Invalid("conversation.window_size must be at least 1".into()));
        }
        if self.conversation.max_tool_rounds == 0 {
            return Err(ConfigError::Invalid("conversation.max_tool_rounds must be at least 1".into()));
        }
        if self.mcp_server.command.trim().is_empty() {
            return Err(ConfigError::Invalid("mcp_server.command must not be empty".into()));
        }
        if self.model.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model.model must not be empty".into()));
        }
        Ok(())
    }
}
