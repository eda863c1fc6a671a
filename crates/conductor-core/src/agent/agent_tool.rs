//! Sub-agent exposed as a tool
//!
//! The outer agent sees an ordinary tool taking `{query}` and returning text.
//! Each invocation runs a fresh, stateless agent; failures come back as an
//! error string instead of propagating.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::logging::Logger;
use crate::tools::{required_str, ToolError, ToolHandler, ToolOutcome, ToolRegistry};
use crate::types::{CancellationToken, Tool};

use super::backend::ModelBackend;
use super::prompts::WEATHER_SYSTEM_PROMPT;
use super::runner::{Agent, DEFAULT_MAX_TOOL_ROUNDS};

pub const WEATHER_ASSISTANT_TOOL: &str = "weather_assistant";

/// A complete agent wrapped as a single-query tool
pub struct AgentTool {
    name: String,
    description: String,
    /// Human-readable name used in error strings
    label: String,
    system_prompt: String,
    backend: Arc<ModelBackend>,
    tools: Arc<ToolRegistry>,
    max_tool_rounds: usize,
    logger: Arc<dyn Logger>,
}

impl AgentTool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        system_prompt: impl Into<String>,
        backend: Arc<ModelBackend>,
        tools: Arc<ToolRegistry>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let name = name.into();
        Self {
            label: name.replace('_', " "),
            name,
            description: description.into(),
            system_prompt: system_prompt.into(),
            backend,
            tools,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            logger,
        }
    }

    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    /// Run one query through a fresh agent; never fails
    pub async fn ask(&self, query: &str) -> String {
        let mut agent = Agent::new(
            &self.name,
            &self.system_prompt,
            Arc::clone(&self.backend),
            Arc::clone(&self.tools),
            Arc::clone(&self.logger),
        )
        .with_max_tool_rounds(self.max_tool_rounds);

        match agent.run(query, &CancellationToken::new()).await {
            Ok(answer) => answer,
            Err(e) => self.error_text(&e),
        }
    }

    fn error_text(&self, err: &dyn std::fmt::Display) -> String {
        self.logger.warn(&format!("[AgentTool:{}] Failed: {}", self.name, err));
        format!("Error in {}: {}", self.label, err)
    }
}

#[async_trait]
impl ToolHandler for AgentTool {
    fn definition(&self) -> Tool {
        Tool::new(&self.name, &self.description).with_schema(json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "The request for this assistant" }
            },
            "required": ["query"]
        }))
    }

    async fn invoke(&self, input: Value) -> ToolOutcome {
        match required_str(&input, "query") {
            Ok(query) => Ok(self.ask(query).await),
            Err(e) => Ok(self.error_text(&e)),
        }
    }
}

/// Build the weather assistant over a shared backend and an HTTP tool
pub fn weather_assistant(
    backend: Arc<ModelBackend>,
    http: Arc<dyn ToolHandler>,
    max_tool_rounds: usize,
    logger: Arc<dyn Logger>,
) -> Result<AgentTool, ToolError> {
    let tools = Arc::new(ToolRegistry::new(Arc::clone(&logger)));
    tools.register(http)?;

    Ok(AgentTool::new(
        WEATHER_ASSISTANT_TOOL,
        "Describe the current weather for a US city and state, e.g. \"Denver, CO\". \
         Returns one short sentence without numbers or place names.",
        WEATHER_SYSTEM_PROMPT,
        backend,
        tools,
        logger,
    )
    .with_max_tool_rounds(max_tool_rounds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelSettings;
    use crate::logging::NoOpLogger;
    use crate::providers::{MockProvider, MockTurn};

    struct FailingHttp;

    #[async_trait]
    impl ToolHandler for FailingHttp {
        fn definition(&self) -> Tool {
            Tool::new("http_request", "Make an HTTP request")
        }

        async fn invoke(&self, _input: Value) -> ToolOutcome {
            Err(ToolError::Http("connection refused".to_string()))
        }
    }

    fn logger() -> Arc<dyn Logger> {
        Arc::new(NoOpLogger)
    }

    fn assistant(turns: Vec<MockTurn>) -> (Arc<MockProvider>, AgentTool) {
        let provider = Arc::new(MockProvider::scripted(turns, logger()));
        let backend = Arc::new(ModelBackend::from_settings(
            provider.clone(),
            &ModelSettings::default(),
            None,
            logger(),
        ));
        let tool = weather_assistant(backend, Arc::new(FailingHttp), 4, logger()).unwrap();
        (provider, tool)
    }

    #[tokio::test]
    async fn test_answer_is_returned() {
        let (provider, tool) = assistant(vec![MockTurn::text("Sunny and the sky is clear")]);
        let out = tool.invoke(json!({"query": "Denver, CO"})).await.unwrap();
        assert_eq!(out, "Sunny and the sky is clear");

        let request = &provider.requests()[0];
        assert_eq!(request.messages[0].text(), Some(WEATHER_SYSTEM_PROMPT));
        assert_eq!(request.tools, vec!["http_request".to_string()]);
    }

    #[tokio::test]
    async fn test_backend_failure_becomes_error_string() {
        let (_, tool) = assistant(vec![MockTurn::Error("throttled".to_string())]);
        let out = tool.invoke(json!({"query": "Denver, CO"})).await.unwrap();
        assert!(out.starts_with("Error in weather assistant: "));
        assert!(out.contains("throttled"));
    }

    #[tokio::test]
    async fn test_network_failure_is_left_to_the_model() {
        let (provider, tool) = assistant(vec![
            MockTurn::tool_call("c1", "http_request", json!({"url": "https://api.weather.gov/points/39.7,-104.9"})),
            MockTurn::text("Weather data is unavailable right now"),
        ]);
        let out = tool.ask("Denver, CO").await;
        assert_eq!(out, "Weather data is unavailable right now");
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_bad_input_never_raises() {
        let (provider, tool) = assistant(vec![]);
        let out = tool.invoke(json!({"q": 1})).await.unwrap();
        assert!(out.starts_with("Error in weather assistant: "));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_each_invocation_starts_fresh() {
        let (provider, tool) = assistant(vec![MockTurn::text("Clear"), MockTurn::text("Rainy")]);
        tool.ask("Denver, CO").await;
        tool.ask("Seattle, WA").await;
        assert_eq!(provider.requests()[1].messages.len(), 2);
    }

    #[test]
    fn test_definition() {
        let (_, tool) = assistant(vec![]);
        let def = tool.definition();
        assert_eq!(def.name, WEATHER_ASSISTANT_TOOL);
        assert_eq!(def.input_schema.unwrap()["required"][0], "query");
    }
}
