//! Configuration
//!
//! - `ConfigFile`: optional YAML file with defaults for every field
//! - `Settings`: the file resolved against a `SecretStore`, built once at startup

mod error;
mod file;
mod settings;

pub use error::{ConfigError, ConfigResult};
pub use file::{
    ConfigFile, ConversationSettings, HttpToolSettings, McpServerSettings, ModelSettings,
    ShellToolSettings, ToolSettings,
};
pub use settings::{Credentials, Settings};
