//! Resolved runtime settings
//!
//! `Settings` is the single value built at startup from the config file and
//! the secret store. Components receive the parts they need from it.

use std::path::Path;
use std::time::Duration;

use crate::secrets::SecretStore;

use super::error::{ConfigError, ConfigResult};
use super::file::{
    ConfigFile, ConversationSettings, McpServerSettings, ModelSettings, ToolSettings,
};

/// Credentials forwarded to the external tool server, in configured order
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    vars: Vec<(String, String)>,
}

impl Credentials {
    /// Build from explicit name/value pairs
    pub fn new(vars: Vec<(String, String)>) -> Self {
        Self { vars }
    }

    /// Variables as name/value pairs
    pub fn vars(&self) -> &[(String, String)] {
        &self.vars
    }

    /// Look up a credential value by variable name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.vars.iter().map(|(k, _)| format!("{}=***", k)))
            .finish()
    }
}

/// Fully resolved settings
#[derive(Clone)]
pub struct Settings {
    pub model: ModelSettings,
    /// API key for the model provider, if one was found
    pub model_api_key: Option<String>,
    pub mcp_server: McpServerSettings,
    pub credentials: Credentials,
    pub conversation: ConversationSettings,
    pub tools: ToolSettings,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("model", &self.model)
            .field("model_api_key", &self.model_api_key.as_ref().map(|_| "***"))
            .field("mcp_server", &self.mcp_server)
            .field("credentials", &self.credentials)
            .field("conversation", &self.conversation)
            .field("tools", &self.tools)
            .finish()
    }
}

impl Settings {
    /// Load the config file at `path` (or the user default) and resolve secrets
    pub fn load(path: Option<&Path>, secrets: &dyn SecretStore) -> ConfigResult<Self> {
        let file = match path {
            Some(p) => ConfigFile::load(p)?,
            None => ConfigFile::load(&ConfigFile::user_path())?,
        };
        Self::resolve(file, secrets)
    }

    /// Resolve a parsed config file against a secret store
    ///
    /// Every forwarded credential must be present under its exact name; the
    /// first missing one is reported.
    pub fn resolve(file: ConfigFile, secrets: &dyn SecretStore) -> ConfigResult<Self> {
        file.validate()?;

        let mut vars = Vec::with_capacity(file.mcp_server.forward_env.len());
        for name in &file.mcp_server.forward_env {
            let value = secrets
                .get_exact(name)
                .ok_or_else(|| ConfigError::MissingCredential(name.clone()))?;
            vars.push((name.clone(), value));
        }

        let model_api_key = secrets.get(&file.model.provider);

        Ok(Self {
            model: file.model,
            model_api_key,
            mcp_server: file.mcp_server,
            credentials: Credentials::new(vars),
            conversation: file.conversation,
            tools: file.tools,
        })
    }

    /// Timeout applied to each external tool call
    pub fn tool_call_timeout(&self) -> Duration {
        Duration::from_secs(self.mcp_server.call_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::{EnvSecretStore, MemorySecretStore};

    fn full_store() -> MemorySecretStore {
        MemorySecretStore::with_secrets([
            ("API_KEY", "key-1"),
            ("SHUTTERSTOCK_API_TOKEN", "token-2"),
            ("openai", "sk-test"),
        ])
    }

    #[test]
    fn test_resolve_collects_credentials_in_order() {
        let settings = Settings::resolve(ConfigFile::default(), &full_store()).unwrap();
        let names: Vec<_> = settings.credentials.vars().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["API_KEY", "SHUTTERSTOCK_API_TOKEN"]);
        assert_eq!(settings.credentials.get("SHUTTERSTOCK_API_TOKEN"), Some("token-2"));
        assert_eq!(settings.model_api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_missing_first_credential_fails() {
        let store = MemorySecretStore::with_secrets([("SHUTTERSTOCK_API_TOKEN", "token")]);
        let err = Settings::resolve(ConfigFile::default(), &store).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential(ref n) if n == "API_KEY"));
        assert_eq!(err.to_string(), "API_KEY environment variable is not set.");
    }

    #[test]
    fn test_missing_second_credential_fails() {
        let store = MemorySecretStore::with_secrets([("API_KEY", "key")]);
        let err = Settings::resolve(ConfigFile::default(), &store).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential(ref n) if n == "SHUTTERSTOCK_API_TOKEN"));
    }

    #[test]
    fn test_forwarded_credential_needs_exact_name() {
        std::env::remove_var("CONDUCTOR_TEST_TOOL_TOKEN");
        std::env::set_var("CONDUCTOR_TEST_TOOL_TOKEN_API_KEY", "unrelated");

        let mut file = ConfigFile::default();
        file.mcp_server.forward_env = vec!["CONDUCTOR_TEST_TOOL_TOKEN".to_string()];
        let err = Settings::resolve(file, &EnvSecretStore::new()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential(ref n) if n == "CONDUCTOR_TEST_TOOL_TOKEN"));

        std::env::remove_var("CONDUCTOR_TEST_TOOL_TOKEN_API_KEY");
    }

    #[test]
    fn test_model_key_is_optional() {
        let store = MemorySecretStore::with_secrets([
            ("API_KEY", "key"),
            ("SHUTTERSTOCK_API_TOKEN", "token"),
        ]);
        let settings = Settings::resolve(ConfigFile::default(), &store).unwrap();
        assert!(settings.model_api_key.is_none());
    }

    #[test]
    fn test_debug_redacts_values() {
        let settings = Settings::resolve(ConfigFile::default(), &full_store()).unwrap();
        let rendered = format!("{:?}", settings);
        assert!(rendered.contains("API_KEY=***"));
        assert!(!rendered.contains("key-1"));
        assert!(!rendered.contains("sk-test"));
    }
}
