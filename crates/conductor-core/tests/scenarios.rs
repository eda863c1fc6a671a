//! End-to-end sessions driven through `App` with a scripted model

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use conductor_core::agent::{WEATHER_ASSISTANT_TOOL, WEATHER_SYSTEM_PROMPT};
use conductor_core::mcp::{McpResult, ToolSource};
use conductor_core::providers::{MockProvider, MockTurn};
use conductor_core::types::{ContentPart, MessageContent, MessageRole};
use conductor_core::{
    App, CancellationToken, ChatMessage, ConfigFile, ConversationWindow, MemorySecretStore, NoOpLogger,
    Settings, ShellExit, Tool,
};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn settings(file: ConfigFile) -> Settings {
    let store = MemorySecretStore::with_secrets([("API_KEY", "key"), ("SHUTTERSTOCK_API_TOKEN", "token")]);
    Settings::resolve(file, &store).unwrap()
}

fn scripted_app(file: ConfigFile, turns: Vec<MockTurn>) -> (Arc<MockProvider>, App) {
    let provider = Arc::new(MockProvider::scripted(turns, Arc::new(NoOpLogger)));
    let app = App::new(settings(file), Arc::new(NoOpLogger)).with_provider(provider.clone());
    (provider, app)
}

/// Content of the tool result carried by `message`, if any
fn tool_result(message: &ChatMessage) -> Option<(&str, bool)> {
    match &message.content {
        MessageContent::Parts(parts) => parts.iter().find_map(|p| match p {
            ContentPart::ToolResult { content, is_error, .. } => Some((content.as_str(), *is_error)),
            _ => None,
        }),
        MessageContent::Text(_) => None,
    }
}

#[derive(Default)]
struct CountingSource {
    shutdowns: AtomicUsize,
}

#[async_trait]
impl ToolSource for CountingSource {
    fn name(&self) -> &str {
        "mcp-server-node"
    }

    async fn list_tools(&self) -> McpResult<Vec<Tool>> {
        Ok(vec![Tool::new("greet", "Greet someone by name")])
    }

    async fn call_tool(&self, _name: &str, arguments: Value) -> McpResult<String> {
        Ok(format!("Hello, {}!", arguments["name"].as_str().unwrap_or("stranger")))
    }

    async fn shutdown(&self) -> McpResult<()> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Minimal stand-in for the weather API: points lookup, then forecast
async fn weather_api(connections: usize) -> (String, tokio::task::JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let forecast_url = format!("{}/gridpoints/BOU/62,60/forecast", base);

    let handle = tokio::spawn(async move {
        let mut seen = Vec::new();
        for _ in 0..connections {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let mut request = Vec::new();
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                if n == 0 || request.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            let request = String::from_utf8_lossy(&request).to_string();
            let body = if request.starts_with("GET /points/") {
                json!({ "properties": { "forecast": forecast_url } }).to_string()
            } else {
                json!({ "properties": { "periods": [
                    { "name": "Today", "temperature": 71, "shortForecast": "Sunny" }
                ] } })
                .to_string()
            };
            let reply = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/geo+json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            seen.push(request);
        }
        seen
    });

    (base, handle)
}

#[tokio::test]
async fn exit_ends_the_session_without_another_prompt() {
    let (provider, app) = scripted_app(ConfigFile::default(), vec![]);
    let mut output = Vec::new();

    let exit = app
        .run_with_source(None, "exit\nwhat is the weather?\n".as_bytes(), &mut output, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(exit, ShellExit::Quit);
    assert_eq!(provider.call_count(), 0);

    let output = String::from_utf8(output).unwrap();
    assert_eq!(output.matches("> ").count(), 1);
    assert!(output.contains("Goodbye!"));
}

#[tokio::test]
async fn weather_request_is_delegated_to_the_sub_agent_once() {
    let (base, server) = weather_api(2).await;
    let sentence = "Sunny and the sky is clear";

    let (provider, app) = scripted_app(
        ConfigFile::default(),
        vec![
            MockTurn::tool_call("call-1", WEATHER_ASSISTANT_TOOL, json!({ "query": "Denver, CO" })),
            MockTurn::tool_call(
                "sub-1",
                "http_request",
                json!({ "url": format!("{}/points/39.7392,-104.9903", base) }),
            ),
            MockTurn::tool_call(
                "sub-2",
                "http_request",
                json!({ "url": format!("{}/gridpoints/BOU/62,60/forecast", base) }),
            ),
            MockTurn::text(sentence),
            MockTurn::text(sentence),
        ],
    );

    let mut output = Vec::new();
    let exit = app
        .run_with_source(
            None,
            "What's the weather in Denver, CO?\nexit\n".as_bytes(),
            &mut output,
            CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(exit, ShellExit::Quit);

    let requests = provider.requests();
    assert_eq!(requests.len(), 5);

    let sub_agent_runs = requests
        .iter()
        .filter(|r| r.messages[0].text() == Some(WEATHER_SYSTEM_PROMPT) && r.messages.len() == 2)
        .count();
    assert_eq!(sub_agent_runs, 1);

    // the orchestrator's last request carries the sub-agent's answer as a tool result
    let last = requests[4].messages.last().unwrap();
    assert_eq!(last.role, MessageRole::Tool);
    let (delegated, is_error) = tool_result(last).unwrap();
    assert!(!is_error);
    assert_eq!(delegated, sentence);
    assert!(!delegated.chars().any(|c| c.is_ascii_digit()));
    assert!(!delegated.contains("Denver"));
    assert!(!delegated.contains("CO"));

    let seen = server.await.unwrap();
    assert!(seen[0].starts_with("GET /points/39.7392,-104.9903"));
    assert!(seen[1].starts_with("GET /gridpoints/BOU/62,60/forecast"));

    assert!(String::from_utf8(output).unwrap().contains(sentence));
}

#[tokio::test]
async fn unavailable_tool_is_reported_without_crashing() {
    let mut file = ConfigFile::default();
    file.mcp_server.command = "/nonexistent/mcp-server-node".to_string();

    let (provider, app) = scripted_app(
        file,
        vec![
            MockTurn::tool_call("call-1", "search_shutterstock", json!({ "query": "mountains" })),
            MockTurn::text("The image search tool is not available right now."),
            MockTurn::text("Echo is still here."),
        ],
    );

    let mut output = Vec::new();
    let exit = app
        .run(
            "Find me pictures of mountains\nare you still there?\nexit\n".as_bytes(),
            &mut output,
            CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(exit, ShellExit::Quit);

    let requests = provider.requests();
    assert!(!requests[0].tools.contains(&"search_shutterstock".to_string()));

    let (content, is_error) = tool_result(requests[1].messages.last().unwrap()).unwrap();
    assert!(is_error);
    assert!(content.contains("Tool not found: search_shutterstock"));

    let output = String::from_utf8(output).unwrap();
    assert!(output.contains("The image search tool is not available right now."));
    assert!(output.contains("Echo is still here."));
}

#[test]
fn window_of_twenty_evicts_the_first_of_twenty_one() {
    let mut window = ConversationWindow::new(20);
    for i in 1..=21 {
        window.append(ChatMessage::user(format!("message #{}", i)));
    }

    let kept: Vec<_> = window.snapshot().iter().filter_map(|m| m.text().map(str::to_string)).collect();
    let expected: Vec<_> = (2..=21).map(|i| format!("message #{}", i)).collect();
    assert_eq!(kept, expected);
}

#[tokio::test]
async fn discovered_tools_are_usable_and_source_closes_once() {
    let (provider, app) = scripted_app(
        ConfigFile::default(),
        vec![
            MockTurn::tool_call("call-1", "greet", json!({ "name": "Ada" })),
            MockTurn::text("The server says: Hello, Ada!"),
        ],
    );
    let source = Arc::new(CountingSource::default());

    let mut output = Vec::new();
    app.run_with_source(
        Some(source.clone() as Arc<dyn ToolSource>),
        "greet Ada\n".as_bytes(),
        &mut output,
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(source.shutdowns.load(Ordering::SeqCst), 1);
    let requests = provider.requests();
    let (content, _) = tool_result(requests[1].messages.last().unwrap()).unwrap();
    assert_eq!(content, "Hello, Ada!");
}

#[tokio::test]
async fn interrupt_during_a_turn_still_closes_the_source_once() {
    let provider = Arc::new(MockProvider::fixed("too late", Arc::new(NoOpLogger)).with_delay(5_000));
    let app = App::new(settings(ConfigFile::default()), Arc::new(NoOpLogger)).with_provider(provider);
    let source = Arc::new(CountingSource::default());
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let mut output = Vec::new();
    let exit = app
        .run_with_source(
            Some(source.clone() as Arc<dyn ToolSource>),
            "slow question\nnext question\n".as_bytes(),
            &mut output,
            cancel,
        )
        .await
        .unwrap();

    assert_eq!(exit, ShellExit::Interrupted);
    assert_eq!(source.shutdowns.load(Ordering::SeqCst), 1);
    assert!(String::from_utf8(output).unwrap().contains("Execution interrupted. Exiting..."));
}
