//! Core traits and types for secret lookup

use thiserror::Error;

/// Errors that can occur during secret store operations
#[derive(Error, Debug)]
pub enum SecretStoreError {
    #[error("Store is read-only")]
    ReadOnly,

    #[error("Secret not found: {0}")]
    NotFound(String),
}

pub type SecretStoreResult<T> = Result<T, SecretStoreError>;

/// Trait for secret storage implementations
///
/// Credentials are read through a store exactly once, at startup, and then
/// travel inside `Settings`. Nothing below the configuration layer reads the
/// process environment directly.
pub trait SecretStore: Send + Sync {
    /// Human-readable name of this store
    fn name(&self) -> &str;

    /// Retrieve a secret by key
    ///
    /// The key can be:
    /// - A provider name (e.g., "openai") which gets mapped to the appropriate env var
    /// - A direct key (e.g., "SHUTTERSTOCK_API_TOKEN")
    fn get(&self, key: &str) -> Option<String>;

    /// Retrieve a secret stored under exactly `key`
    ///
    /// No provider mapping or name derivation; forwarded credentials are
    /// looked up this way so one variable never stands in for another.
    fn get_exact(&self, key: &str) -> Option<String> {
        self.get(key)
    }

    /// Retrieve a secret that must be present
    fn require(&self, key: &str) -> SecretStoreResult<String> {
        self.get(key).ok_or_else(|| SecretStoreError::NotFound(key.to_string()))
    }

    /// Check if a secret exists
    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}
