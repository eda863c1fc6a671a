//! Model backend: one request in, one tagged reply out
//!
//! Wraps a streaming `Provider` and folds its chunks into either a direct
//! answer or the list of tool calls the model asked for.

use std::sync::Arc;

use futures::StreamExt;

use crate::config::ModelSettings;
use crate::logging::Logger;
use crate::providers::{Provider, ProviderError, ProviderModelConfig, ProviderResult, StreamChatOptions};
use crate::types::{CancellationToken, ChatMessage, StreamChunk, Tool, ToolCall};

/// What the model decided for this round
#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    /// Final text answer
    Direct(String),
    /// Tool invocations, in emission order
    ToolCalls(Vec<ToolCall>),
}

/// A provider bound to a model and sampling parameters
pub struct ModelBackend {
    provider: Arc<dyn Provider>,
    model: ProviderModelConfig,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    logger: Arc<dyn Logger>,
}

impl ModelBackend {
    pub fn new(provider: Arc<dyn Provider>, model: ProviderModelConfig, logger: Arc<dyn Logger>) -> Self {
        Self {
            provider,
            model,
            temperature: None,
            max_tokens: None,
            logger,
        }
    }

    /// Build from the `model` config section and the resolved API key
    pub fn from_settings(
        provider: Arc<dyn Provider>,
        settings: &ModelSettings,
        api_key: Option<String>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let mut model = ProviderModelConfig::new(&settings.model);
        model.api_key = api_key;
        model.api_base = settings.api_base.clone();

        Self::new(provider, model, logger)
            .with_temperature(settings.temperature)
            .with_max_tokens(settings.max_tokens)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Provider name, for logs
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Model identifier, for logs
    pub fn model_name(&self) -> &str {
        &self.model.model
    }

    fn options(&self, tools: Vec<Tool>) -> StreamChatOptions {
        let mut options = StreamChatOptions::new().with_tools(tools);
        options.temperature = self.temperature;
        options.max_tokens = self.max_tokens;
        options
    }

    /// Send one request and wait for the complete reply
    ///
    /// Any tool call in the stream makes this a `ToolCalls` reply; text that
    /// accompanies tool calls is dropped.
    pub async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        tools: Vec<Tool>,
        cancel: &CancellationToken,
    ) -> ProviderResult<ModelReply> {
        let mut stream = tokio::select! {
            _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
            stream = self.provider.stream_chat(messages, self.model.clone(), self.options(tools), cancel.clone()) => stream?,
        };

        let mut text = String::new();
        let mut calls = Vec::new();

        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
                next = stream.next() => next,
            };

            match next {
                Some(Ok(StreamChunk::Text { text: chunk })) => text.push_str(&chunk),
                Some(Ok(StreamChunk::ToolCall { tool_call })) => calls.push(tool_call),
                Some(Ok(StreamChunk::ToolCallDelta { .. })) => {}
                Some(Err(e)) => return Err(e),
                None => break,
            }
        }

        if calls.is_empty() {
            Ok(ModelReply::Direct(text))
        } else {
            if !text.trim().is_empty() {
                self.logger.debug(&format!(
                    "[ModelBackend] Dropping {} chars of text sent alongside tool calls",
                    text.len()
                ));
            }
            Ok(ModelReply::ToolCalls(calls))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::providers::{MockProvider, MockTurn};
    use serde_json::json;

    fn backend(provider: Arc<MockProvider>) -> ModelBackend {
        ModelBackend::from_settings(provider, &ModelSettings::default(), None, Arc::new(NoOpLogger))
    }

    #[tokio::test]
    async fn test_direct_reply() {
        let provider = Arc::new(MockProvider::fixed("Sunny and the sky is clear", Arc::new(NoOpLogger)));
        let reply = backend(provider)
            .complete(vec![ChatMessage::user("hi")], vec![], &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(reply, ModelReply::Direct("Sunny and the sky is clear".to_string()));
    }

    #[tokio::test]
    async fn test_tool_calls_reply_keeps_order() {
        let provider = Arc::new(MockProvider::scripted(
            [MockTurn::ToolCalls(vec![
                ToolCall::new("1", "echo", json!({})),
                ToolCall::new("2", "greet", json!({})),
            ])],
            Arc::new(NoOpLogger),
        ));
        let reply = backend(provider)
            .complete(vec![ChatMessage::user("hi")], vec![], &CancellationToken::new())
            .await
            .unwrap();
        match reply {
            ModelReply::ToolCalls(calls) => {
                let names: Vec<_> = calls.iter().map(|c| c.name.as_str()).collect();
                assert_eq!(names, vec!["echo", "greet"]);
            }
            other => panic!("unexpected reply: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let provider = Arc::new(MockProvider::error("quota exceeded", Arc::new(NoOpLogger)));
        let err = backend(provider)
            .complete(vec![ChatMessage::user("hi")], vec![], &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_cancelled_before_reply() {
        let provider = Arc::new(MockProvider::fixed("late", Arc::new(NoOpLogger)).with_delay(1_000));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = backend(provider)
            .complete(vec![ChatMessage::user("hi")], vec![], &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Cancelled));
    }

    #[tokio::test]
    async fn test_tools_are_advertised() {
        let provider = Arc::new(MockProvider::fixed("ok", Arc::new(NoOpLogger)));
        let backend = backend(provider.clone());
        assert_eq!(backend.model_name(), "gpt-4o-mini");
        backend
            .complete(vec![ChatMessage::user("hi")], vec![Tool::new("echo", "Echo")], &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(provider.requests()[0].tools, vec!["echo".to_string()]);
    }
}
