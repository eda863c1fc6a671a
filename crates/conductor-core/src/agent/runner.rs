//! Agent decision loop
//!
//! One call to `run` is one user turn: the model is consulted with the system
//! prompt, the remembered history and the current tool set, tools are run
//! when asked for, and the loop ends with a direct answer.

use std::sync::Arc;

use crate::logging::Logger;
use crate::memory::ConversationWindow;
use crate::tools::ToolRegistry;
use crate::types::{CancellationToken, ChatMessage, MessageRole};

use super::backend::{ModelBackend, ModelReply};
use super::error::{AgentError, AgentResult};

pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 8;

/// How an agent remembers earlier turns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationPolicy {
    /// Keep the most recent N messages
    SlidingWindow(usize),
    /// Every turn starts from nothing
    Stateless,
}

/// A conversational agent with its own instructions and tools
pub struct Agent {
    name: String,
    system_prompt: String,
    backend: Arc<ModelBackend>,
    tools: Arc<ToolRegistry>,
    window: Option<ConversationWindow>,
    max_tool_rounds: usize,
    logger: Arc<dyn Logger>,
}

impl Agent {
    /// Create a stateless agent
    pub fn new(
        name: impl Into<String>,
        system_prompt: impl Into<String>,
        backend: Arc<ModelBackend>,
        tools: Arc<ToolRegistry>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            name: name.into(),
            system_prompt: system_prompt.into(),
            backend,
            tools,
            window: None,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            logger,
        }
    }

    pub fn with_conversation(mut self, policy: ConversationPolicy) -> Self {
        self.window = match policy {
            ConversationPolicy::SlidingWindow(size) => Some(ConversationWindow::new(size)),
            ConversationPolicy::Stateless => None,
        };
        self
    }

    /// Bound on model rounds that end in tool calls within one turn
    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds.max(1);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Remembered messages, oldest first
    pub fn history(&self) -> Vec<ChatMessage> {
        self.window.as_ref().map(|w| w.snapshot()).unwrap_or_default()
    }

    /// Window history usable as request context
    ///
    /// Eviction can cut a turn in half; everything before the first user
    /// message is dropped so no tool result arrives without its call.
    fn context(&self) -> Vec<ChatMessage> {
        let history = self.history();
        let start = history
            .iter()
            .position(|m| m.role == MessageRole::User)
            .unwrap_or(history.len());
        history[start..].to_vec()
    }

    /// Run one turn and return the final answer
    ///
    /// The turn's messages are committed to the window only once the answer
    /// is produced; a failed or cancelled turn leaves memory untouched.
    pub async fn run(&mut self, input: &str, cancel: &CancellationToken) -> AgentResult<String> {
        self.logger.info(&format!("[Agent:{}] New turn", self.name));

        let context = self.context();
        let mut turn = vec![ChatMessage::user(input)];
        let mut rounds = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(AgentError::Cancelled);
            }

            let mut messages = Vec::with_capacity(1 + context.len() + turn.len());
            messages.push(ChatMessage::system(&self.system_prompt));
            messages.extend(context.iter().cloned());
            messages.extend(turn.iter().cloned());

            let reply = self
                .backend
                .complete(messages, self.tools.llm_tools(), cancel)
                .await?;

            match reply {
                ModelReply::Direct(answer) => {
                    self.logger.info(&format!(
                        "[Agent:{}] Answered after {} tool round(s)",
                        self.name, rounds
                    ));
                    turn.push(ChatMessage::assistant(&answer));
                    if let Some(window) = self.window.as_mut() {
                        window.extend(turn);
                    }
                    return Ok(answer);
                }
                ModelReply::ToolCalls(calls) => {
                    if rounds >= self.max_tool_rounds {
                        self.logger.warn(&format!(
                            "[Agent:{}] Tool round limit {} reached",
                            self.name, self.max_tool_rounds
                        ));
                        return Err(AgentError::ToolRoundsExceeded {
                            limit: self.max_tool_rounds,
                        });
                    }
                    rounds += 1;

                    self.logger.debug(&format!(
                        "[Agent:{}] Round {}: {} tool call(s)",
                        self.name,
                        rounds,
                        calls.len()
                    ));
                    turn.push(ChatMessage::tool_calls(&calls));

                    for call in &calls {
                        let result = tokio::select! {
                            _ = cancel.cancelled() => return Err(AgentError::Cancelled),
                            result = self.tools.execute_tool_call(call) => result,
                        };
                        turn.push(ChatMessage::tool_result(&result));
                    }
                }
            }
        }
    }
}
