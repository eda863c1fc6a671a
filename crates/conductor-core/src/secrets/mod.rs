//! Secret lookup
//!
//! - `SecretStore` trait
//! - `EnvSecretStore`: process environment (what the binary uses)
//! - `MemorySecretStore`: explicit values for tests and embedding

mod traits;
mod env_store;
mod memory_store;

pub use traits::{SecretStore, SecretStoreError, SecretStoreResult};
pub use env_store::EnvSecretStore;
pub use memory_store::MemorySecretStore;
