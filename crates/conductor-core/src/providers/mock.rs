//! Mock provider for testing
//!
//! Deterministic responses without network access. Scripted mode replays a
//! queue of turns (text, tool calls or errors) and every request is recorded
//! so tests can assert what the model was shown.

use async_trait::async_trait;
use futures::{stream, StreamExt};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use super::error::{ProviderError, ProviderResult};
use super::traits::{Provider, ProviderModelConfig, StreamChatOptions, StreamResponse};
use crate::logging::Logger;
use crate::types::{CancellationToken, ChatMessage, MessageRole, StreamChunk, ToolCall};

/// One scripted model turn
#[derive(Debug, Clone)]
pub enum MockTurn {
    /// Reply with text
    Text(String),
    /// Request these tool invocations
    ToolCalls(Vec<ToolCall>),
    /// Fail the request
    Error(String),
}

impl MockTurn {
    /// Text reply
    pub fn text(text: impl Into<String>) -> Self {
        MockTurn::Text(text.into())
    }

    /// Single tool call reply
    pub fn tool_call(id: impl Into<String>, name: impl Into<String>, input: serde_json::Value) -> Self {
        MockTurn::ToolCalls(vec![ToolCall::new(id, name, input)])
    }
}

/// Mock response mode
#[derive(Debug, Clone, Default)]
pub enum MockMode {
    /// Echo back the last user message
    #[default]
    Echo,
    /// Return a fixed response
    Fixed(String),
    /// Fail every request
    Error(String),
    /// Replay turns in order; an exhausted script is an error
    Script(VecDeque<MockTurn>),
}

/// What the provider was asked, captured per request
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub messages: Vec<ChatMessage>,
    /// Names of the tools advertised with the request
    pub tools: Vec<String>,
}

/// Mock model provider for testing
pub struct MockProvider {
    mode: Mutex<MockMode>,
    chunk_delay_ms: u64,
    requests: Mutex<Vec<MockRequest>>,
    logger: Arc<dyn Logger>,
}

impl MockProvider {
    /// Create with a specific mode
    pub fn with_mode(mode: MockMode, logger: Arc<dyn Logger>) -> Self {
        Self {
            mode: Mutex::new(mode),
            chunk_delay_ms: 0,
            requests: Mutex::new(Vec::new()),
            logger,
        }
    }

    /// Create an echo provider (echoes back user message)
    pub fn echo(logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Echo, logger)
    }

    /// Create a fixed response provider
    pub fn fixed(response: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Fixed(response.into()), logger)
    }

    /// Create an error-producing provider
    pub fn error(message: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Error(message.into()), logger)
    }

    /// Create a scripted provider
    pub fn scripted(turns: impl IntoIterator<Item = MockTurn>, logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Script(turns.into_iter().collect()), logger)
    }

    /// Delay before each emitted chunk
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.chunk_delay_ms = delay_ms;
        self
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests received so far
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    fn last_user_message(messages: &[ChatMessage]) -> String {
        messages
            .iter()
            .rev()
            .filter(|m| m.role == MessageRole::User)
            .find_map(|m| m.text().filter(|t| !t.is_empty()).map(str::to_string))
            .unwrap_or_else(|| "Hello from MockProvider!".to_string())
    }

    fn next_turn(&self, messages: &[ChatMessage]) -> MockTurn {
        let mut mode = self.mode.lock();
        match &mut *mode {
            MockMode::Echo => MockTurn::Text(format!("Echo: {}", Self::last_user_message(messages))),
            MockMode::Fixed(response) => MockTurn::Text(response.clone()),
            MockMode::Error(message) => MockTurn::Error(message.clone()),
            MockMode::Script(turns) => turns
                .pop_front()
                .unwrap_or_else(|| MockTurn::Error("mock script exhausted".to_string())),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn stream_chat(
        &self,
        messages: Vec<ChatMessage>,
        _model: ProviderModelConfig,
        options: StreamChatOptions,
        cancel_token: CancellationToken,
    ) -> ProviderResult<StreamResponse> {
        let turn = self.next_turn(&messages);
        self.logger.debug(&format!("[MockProvider] stream_chat: {:?}", turn));

        self.requests.lock().push(MockRequest {
            messages,
            tools: options
                .tools
                .unwrap_or_default()
                .into_iter()
                .map(|t| t.name)
                .collect(),
        });

        let chunks: Vec<ProviderResult<StreamChunk>> = match turn {
            MockTurn::Text(text) => vec![Ok(StreamChunk::text(text))],
            MockTurn::ToolCalls(calls) => calls.into_iter().map(|c| Ok(StreamChunk::tool_call(c))).collect(),
            MockTurn::Error(message) => {
                return Err(ProviderError::Other(format!("Mock error: {}", message)));
            }
        };

        let delay_ms = self.chunk_delay_ms;
        let stream = stream::iter(chunks).then(move |chunk| {
            let cancel = cancel_token.clone();
            async move {
                if delay_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                if cancel.is_cancelled() {
                    return Err(ProviderError::Cancelled);
                }
                chunk
            }
        });

        Ok(Box::pin(stream))
    }
}
