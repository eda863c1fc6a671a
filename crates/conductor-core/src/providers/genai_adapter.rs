//! Adapter between conductor types and genai types
//!
//! Conversion functions in both directions, plus client construction with
//! explicit auth: the API key resolved at startup is handed to genai directly.

use std::future::Future;
use std::pin::Pin;

use genai::chat::{
    ChatMessage as GenaiMessage, ChatOptions as GenaiOptions,
    ChatStreamEvent, MessageContent as GenaiContent, Tool as GenaiTool,
    ToolCall as GenaiToolCall, ToolResponse as GenaiToolResponse,
};
use genai::resolver::{AuthData, AuthResolver, Endpoint, ServiceTargetResolver};
use genai::{adapter::AdapterKind, Client, ModelIden, ServiceTarget};
use serde_json::json;

use crate::types::{
    ChatMessage, ContentPart, MessageContent, MessageRole, StreamChunk, Tool, ToolCall,
};

use super::error::{ProviderError, ProviderResult};
use super::traits::StreamChatOptions;

// ============================================================================
// Message Conversion: conductor -> genai
// ============================================================================

/// Convert a ToolCall to genai's ToolCall
///
/// Goes through serde so fields genai adds over time default to empty.
pub fn to_genai_tool_call(call: &ToolCall) -> ProviderResult<GenaiToolCall> {
    let value = json!({
        "call_id": call.id,
        "fn_name": call.name,
        "fn_arguments": call.input,
    });
    Ok(serde_json::from_value(value)?)
}

fn joined_text(parts: &[ContentPart]) -> String {
    parts
        .iter()
        .filter_map(|p| match p {
            ContentPart::Text { text } => Some(text.clone()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Convert a ChatMessage to genai ChatMessage
///
/// Assistant tool-use parts become a genai tool-call message; a tool message
/// becomes a genai tool response.
pub fn to_genai_message(msg: ChatMessage) -> ProviderResult<GenaiMessage> {
    let parts = match msg.content {
        MessageContent::Text(text) => {
            let content = GenaiContent::from(text);
            return Ok(match msg.role {
                MessageRole::System => GenaiMessage::system(content),
                MessageRole::User => GenaiMessage::user(content),
                MessageRole::Assistant | MessageRole::Tool => GenaiMessage::assistant(content),
            });
        }
        MessageContent::Parts(parts) => parts,
    };

    match msg.role {
        MessageRole::Tool => {
            let response = parts.iter().find_map(|p| match p {
                ContentPart::ToolResult { tool_use_id, content, .. } => {
                    Some(GenaiToolResponse::new(tool_use_id.clone(), content.clone()))
                }
                _ => None,
            });
            response.map(GenaiMessage::from).ok_or_else(|| {
                ProviderError::Other("tool message without a tool result part".to_string())
            })
        }
        MessageRole::Assistant => {
            let calls = parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::ToolUse { id, name, input } => {
                        Some(ToolCall::new(id.clone(), name.clone(), input.clone()))
                    }
                    _ => None,
                })
                .map(|c| to_genai_tool_call(&c))
                .collect::<ProviderResult<Vec<_>>>()?;

            if calls.is_empty() {
                Ok(GenaiMessage::assistant(GenaiContent::from(joined_text(&parts))))
            } else {
                Ok(GenaiMessage::from(calls))
            }
        }
        MessageRole::System => Ok(GenaiMessage::system(GenaiContent::from(joined_text(&parts)))),
        MessageRole::User => Ok(GenaiMessage::user(GenaiContent::from(joined_text(&parts)))),
    }
}

/// Convert a vector of messages to genai messages
pub fn to_genai_messages(messages: Vec<ChatMessage>) -> ProviderResult<Vec<GenaiMessage>> {
    messages.into_iter().map(to_genai_message).collect()
}

// ============================================================================
// Tool Conversion: conductor -> genai
// ============================================================================

/// Convert a Tool to genai Tool
pub fn to_genai_tool(tool: Tool) -> GenaiTool {
    let mut genai_tool = GenaiTool::new(&tool.name).with_description(&tool.description);

    if let Some(schema) = tool.input_schema {
        genai_tool = genai_tool.with_schema(schema);
    }

    genai_tool
}

/// Convert tools to genai tools
pub fn to_genai_tools(tools: Vec<Tool>) -> Vec<GenaiTool> {
    tools.into_iter().map(to_genai_tool).collect()
}

// ============================================================================
// Options Conversion: conductor -> genai
// ============================================================================

/// Convert StreamChatOptions to genai ChatOptions
pub fn to_genai_options(options: &StreamChatOptions) -> GenaiOptions {
    let mut genai_opts = GenaiOptions::default();

    if let Some(temp) = options.temperature {
        genai_opts = genai_opts.with_temperature(temp as f64);
    }

    if let Some(max_tokens) = options.max_tokens {
        genai_opts = genai_opts.with_max_tokens(max_tokens);
    }

    // Capture tool calls in stream so we can return them
    genai_opts = genai_opts.with_capture_tool_calls(true);

    genai_opts
}

// ============================================================================
// Response Conversion: genai -> conductor
// ============================================================================

/// Convert genai ToolCall to ToolCall
pub fn from_genai_tool_call(tc: &GenaiToolCall) -> ToolCall {
    ToolCall {
        id: tc.call_id.clone(),
        name: tc.fn_name.clone(),
        input: tc.fn_arguments.clone(),
    }
}

/// Convert one genai stream event into zero or more chunks
///
/// The end event carries every captured tool call, emitted in order.
pub fn from_genai_event(event: ChatStreamEvent) -> Vec<ProviderResult<StreamChunk>> {
    match event {
        ChatStreamEvent::Chunk(chunk) => vec![Ok(StreamChunk::Text {
            text: chunk.content,
        })],
        ChatStreamEvent::ToolCallChunk(chunk) => vec![Ok(StreamChunk::ToolCallDelta {
            id: chunk.tool_call.call_id,
            name: Some(chunk.tool_call.fn_name),
            input_delta: Some(chunk.tool_call.fn_arguments.to_string()),
        })],
        ChatStreamEvent::End(end) => match end.captured_tool_calls() {
            Some(tool_calls) => tool_calls
                .into_iter()
                .map(|tc| Ok(StreamChunk::ToolCall { tool_call: from_genai_tool_call(tc) }))
                .collect(),
            None => Vec::new(),
        },
        ChatStreamEvent::Start => Vec::new(),
        ChatStreamEvent::ReasoningChunk(_) => Vec::new(),
        ChatStreamEvent::ThoughtSignatureChunk(_) => Vec::new(),
    }
}

// ============================================================================
// Provider Resolution
// ============================================================================

/// Provider configuration for routing
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Provider identifier (e.g., "openai", "openrouter")
    pub provider: String,
    /// API key for authentication
    pub api_key: Option<String>,
    /// Custom API base URL
    pub api_base: Option<String>,
}

/// Create a genai Client with explicit auth and endpoint resolution
///
/// When no key was resolved at startup genai falls back to its own lookup,
/// which is what local providers such as ollama expect.
pub fn create_client(config: &ProviderConfig) -> Client {
    let auth_key = config.api_key.clone();

    let auth_resolver = AuthResolver::from_resolver_async_fn(
        move |_model_iden: ModelIden| -> Pin<Box<dyn Future<Output = genai::resolver::Result<Option<AuthData>>> + Send>> {
            let key = auth_key.clone();
            Box::pin(async move { Ok(key.map(AuthData::from_single)) })
        },
    );

    let target_provider = config.provider.to_lowercase();
    let target_api_base = config.api_base.clone();

    let target_resolver = ServiceTargetResolver::from_resolver_fn(
        move |target: ServiceTarget| -> Result<ServiceTarget, genai::resolver::Error> {
            let ServiceTarget { ref model, .. } = target;

            let (endpoint, adapter_kind): (Endpoint, AdapterKind) = match target_provider.as_str() {
                "openrouter" => (
                    Endpoint::from_static("https://openrouter.ai/api/v1/"),
                    AdapterKind::OpenAI,
                ),
                "mistral" => (
                    Endpoint::from_static("https://api.mistral.ai/v1/"),
                    AdapterKind::OpenAI,
                ),
                // Any provider with an explicit base URL is routed there
                _ => match &target_api_base {
                    Some(base) => (Endpoint::from_owned(base.clone()), model.adapter_kind),
                    None => return Ok(target),
                },
            };

            let resolved_model = ModelIden::new(adapter_kind, model.model_name.clone());

            Ok(ServiceTarget {
                endpoint,
                auth: target.auth,
                model: resolved_model,
            })
        },
    );

    Client::builder()
        .with_auth_resolver(auth_resolver)
        .with_service_target_resolver(target_resolver)
        .build()
}

/// Check if a provider is natively supported by genai
pub fn is_genai_native(provider: &str) -> bool {
    matches!(
        provider.to_lowercase().as_str(),
        "openai"
            | "anthropic"
            | "gemini"
            | "ollama"
            | "groq"
            | "xai"
            | "deepseek"
            | "cohere"
            | "fireworks"
            | "together"
    )
}

/// Check if a provider can be handled by genai (native or via OpenAI-compat)
pub fn is_genai_supported(provider: &str) -> bool {
    is_genai_native(provider) || matches!(provider.to_lowercase().as_str(), "openrouter" | "mistral")
}
