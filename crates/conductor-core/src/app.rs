//! Application wiring
//!
//! settings -> provider -> tool source session -> registry -> orchestrator -> shell

use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncWrite};

use crate::agent::{weather_assistant, Agent, ConversationPolicy, ModelBackend, ORCHESTRATOR_SYSTEM_PROMPT};
use crate::config::Settings;
use crate::logging::Logger;
use crate::mcp::{scoped, McpClient, ToolSource};
use crate::providers::{create_provider, Provider};
use crate::shell::{Shell, ShellExit};
use crate::tools::{HttpRequestTool, ShellTool, ToolError, ToolHandler, ToolRegistry};
use crate::types::CancellationToken;

/// Errors that stop the application as a whole
#[derive(Error, Debug)]
pub enum AppError {
    /// A local tool could not be built or registered
    #[error("Tool setup failed: {0}")]
    ToolSetup(#[from] ToolError),

    /// Reading input or writing output failed
    #[error("Terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;

/// The orchestrator application
pub struct App {
    settings: Settings,
    provider: Arc<dyn Provider>,
    logger: Arc<dyn Logger>,
}

impl App {
    /// Build with the provider named in `settings.model.provider`
    pub fn new(settings: Settings, logger: Arc<dyn Logger>) -> Self {
        let provider = create_provider(&settings.model.provider, Arc::clone(&logger));
        Self {
            settings,
            provider,
            logger,
        }
    }

    /// Replace the model provider
    pub fn with_provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.provider = provider;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn backend(&self) -> Arc<ModelBackend> {
        Arc::new(ModelBackend::from_settings(
            Arc::clone(&self.provider),
            &self.settings.model,
            self.settings.model_api_key.clone(),
            Arc::clone(&self.logger),
        ))
    }

    /// Registry holding the locally defined tools
    pub fn local_tools(&self, backend: Arc<ModelBackend>) -> AppResult<Arc<ToolRegistry>> {
        let tools = &self.settings.tools;
        let registry = Arc::new(ToolRegistry::new(Arc::clone(&self.logger)));

        let http: Arc<dyn ToolHandler> = Arc::new(HttpRequestTool::new(&tools.http)?);
        registry.register(Arc::clone(&http))?;

        if tools.shell.enabled {
            registry.register(Arc::new(ShellTool::new(&tools.shell)))?;
        }

        let weather = weather_assistant(
            backend,
            http,
            self.settings.conversation.max_tool_rounds,
            Arc::clone(&self.logger),
        )?;
        registry.register(Arc::new(weather))?;

        Ok(registry)
    }

    /// Spawn the external tool server
    ///
    /// A server that fails to start is logged and skipped; the orchestrator
    /// then runs with local tools only.
    pub async fn open_tool_source(&self) -> Option<Arc<dyn ToolSource>> {
        match McpClient::spawn(
            &self.settings.mcp_server,
            &self.settings.credentials,
            self.settings.tool_call_timeout(),
            Arc::clone(&self.logger),
        )
        .await
        {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                self.logger.warn(&format!(
                    "[App] Tool server '{}' unavailable, continuing with local tools: {}",
                    self.settings.mcp_server.name, e
                ));
                None
            }
        }
    }

    /// Start the tool server, then run the interactive session
    pub async fn run<R, W>(&self, input: R, output: W, cancel: CancellationToken) -> AppResult<ShellExit>
    where
        R: AsyncBufRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        let source = self.open_tool_source().await;
        self.run_with_source(source, input, output, cancel).await
    }

    /// Run the interactive session against an already open tool source
    ///
    /// The source is shut down exactly once when the session ends, however it
    /// ends.
    pub async fn run_with_source<R, W>(
        &self,
        source: Option<Arc<dyn ToolSource>>,
        input: R,
        output: W,
        cancel: CancellationToken,
    ) -> AppResult<ShellExit>
    where
        R: AsyncBufRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        let backend = self.backend();
        let registry = self.local_tools(Arc::clone(&backend))?;

        match source {
            Some(source) => {
                scoped(source, Arc::clone(&self.logger), |source| async move {
                    if let Err(e) = registry.discover(&source).await {
                        self.logger.warn(&format!(
                            "[App] Tool discovery from '{}' failed, continuing with local tools: {}",
                            source.name(),
                            e
                        ));
                    }
                    self.session(backend, registry, input, output, cancel).await
                })
                .await
            }
            None => self.session(backend, registry, input, output, cancel).await,
        }
    }

    async fn session<R, W>(
        &self,
        backend: Arc<ModelBackend>,
        registry: Arc<ToolRegistry>,
        input: R,
        output: W,
        cancel: CancellationToken,
    ) -> AppResult<ShellExit>
    where
        R: AsyncBufRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        for name in &self.settings.tools.disabled {
            registry.set_tool_enabled(name, false);
        }

        self.logger.info(&format!(
            "[App] Orchestrator ready: {} via {}, {} of {} tools enabled",
            backend.model_name(),
            backend.provider_name(),
            registry.enabled_tool_count(),
            registry.tool_count()
        ));

        let conversation = &self.settings.conversation;
        let mut orchestrator = Agent::new(
            "orchestrator",
            ORCHESTRATOR_SYSTEM_PROMPT,
            backend,
            registry,
            Arc::clone(&self.logger),
        )
        .with_conversation(ConversationPolicy::SlidingWindow(conversation.window_size))
        .with_max_tool_rounds(conversation.max_tool_rounds);

        let mut shell = Shell::new(input, output, cancel);
        let exit = shell.run(&mut orchestrator).await?;

        self.logger.info(&format!("[App] Session ended: {:?}", exit));
        Ok(exit)
    }
}
