//! Model provider implementations
//!
//! All real backends go through the `genai` crate, which handles streaming,
//! provider-specific protocols and tool calling. Providers not native to genai
//! (OpenRouter, Mistral) are routed via its `ServiceTargetResolver` using the
//! OpenAI-compatible protocol.
//!
//! The `MockProvider` is kept for testing purposes.

mod traits;
mod error;
mod genai_adapter;
mod genai_provider;
mod mock;

pub use traits::{Provider, ProviderModelConfig, StreamChatOptions, StreamResponse};
pub use error::{ProviderError, ProviderResult};

pub use genai_provider::GenaiProvider;
pub use genai_adapter::{is_genai_native, is_genai_supported, ProviderConfig};

pub use mock::{MockMode, MockProvider, MockRequest, MockTurn};

use crate::logging::Logger;
use std::sync::Arc;

/// Create a provider for the given provider ID
///
/// `mock` yields an echoing `MockProvider`; everything else goes to genai,
/// with unknown IDs treated as OpenAI-compatible endpoints.
pub fn create_provider(provider_id: &str, logger: Arc<dyn Logger>) -> Arc<dyn Provider> {
    match provider_id.to_lowercase().as_str() {
        "mock" => Arc::new(MockProvider::echo(logger)),
        _ => Arc::new(GenaiProvider::new(provider_id, logger)),
    }
}
