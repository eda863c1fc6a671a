//! http_request tool
//!
//! Generic HTTP capability used by the orchestrator and the weather assistant.
//! The National Weather Service API rejects requests without a User-Agent, so
//! one is always set.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::HttpToolSettings;
use crate::types::Tool;

use super::handler::{ToolError, ToolHandler, ToolOutcome};

pub const HTTP_REQUEST_TOOL: &str = "http_request";

const ALLOWED_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD"];

#[derive(Debug, Deserialize)]
struct HttpRequestInput {
    #[serde(default = "default_method")]
    method: String,
    url: String,
    #[serde(default)]
    headers: HashMap<String, String>,
    #[serde(default)]
    body: Option<Value>,
}

fn default_method() -> String {
    "GET".to_string()
}

/// Makes one HTTP request and reports status plus body
pub struct HttpRequestTool {
    client: Client,
    timeout_secs: u64,
    max_response_bytes: usize,
}

impl HttpRequestTool {
    pub fn new(settings: &HttpToolSettings) -> Result<Self, ToolError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| ToolError::Http(e.to_string()))?;

        Ok(Self {
            client,
            timeout_secs: settings.timeout_secs,
            max_response_bytes: settings.max_response_bytes,
        })
    }

    fn parse_input(input: Value) -> Result<(Method, HttpRequestInput), ToolError> {
        let input: HttpRequestInput =
            serde_json::from_value(input).map_err(|e| ToolError::InvalidInput(e.to_string()))?;

        let upper = input.method.trim().to_uppercase();
        if !ALLOWED_METHODS.contains(&upper.as_str()) {
            return Err(ToolError::InvalidInput(format!(
                "unsupported method '{}'",
                input.method
            )));
        }
        let method = Method::from_bytes(upper.as_bytes())
            .map_err(|e| ToolError::InvalidInput(e.to_string()))?;

        if !(input.url.starts_with("http://") || input.url.starts_with("https://")) {
            return Err(ToolError::InvalidInput(format!(
                "url must start with http:// or https://: '{}'",
                input.url
            )));
        }

        Ok((method, input))
    }

    fn map_error(&self, err: reqwest::Error) -> ToolError {
        if err.is_timeout() {
            ToolError::Timeout(self.timeout_secs)
        } else {
            ToolError::Http(err.to_string())
        }
    }
}

/// Cut `body` to at most `max` bytes without splitting a character
pub fn truncate_body(body: &str, max: usize) -> String {
    if body.len() <= max {
        return body.to_string();
    }
    let mut end = max;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}\n... [truncated {} bytes]", &body[..end], body.len() - end)
}

#[async_trait]
impl ToolHandler for HttpRequestTool {
    fn definition(&self) -> Tool {
        Tool::new(
            HTTP_REQUEST_TOOL,
            "Make an HTTP request and return the status code and response body.",
        )
        .with_schema(json!({
            "type": "object",
            "properties": {
                "method": {
                    "type": "string",
                    "enum": ALLOWED_METHODS,
                    "description": "HTTP method (default GET)"
                },
                "url": { "type": "string", "description": "Absolute http(s) URL" },
                "headers": {
                    "type": "object",
                    "additionalProperties": { "type": "string" },
                    "description": "Extra request headers"
                },
                "body": { "description": "Request body: a string is sent as-is, anything else as JSON" }
            },
            "required": ["url"]
        }))
    }

    async fn invoke(&self, input: Value) -> ToolOutcome {
        let (method, input) = Self::parse_input(input)?;

        let mut request = self.client.request(method, &input.url);
        for (name, value) in &input.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        request = match input.body {
            None | Some(Value::Null) => request,
            Some(Value::String(text)) => request.body(text),
            Some(other) => request.json(&other),
        };

        let response = request.send().await.map_err(|e| self.map_error(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_error(e))?;

        Ok(format!(
            "Status: {}\n\n{}",
            status.as_u16(),
            truncate_body(&body, self.max_response_bytes)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn tool() -> HttpRequestTool {
        HttpRequestTool::new(&HttpToolSettings {
            timeout_secs: 5,
            user_agent: "conductor-test/1.0".to_string(),
            max_response_bytes: 16,
        })
        .unwrap()
    }

    /// Serve one canned response and hand back the raw request text
    async fn serve_once(response_body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/forecast", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
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
            let reply = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                response_body.len(),
                response_body
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&request).to_string()
        });

        (url, handle)
    }

    #[test]
    fn test_truncate_body_respects_char_boundary() {
        assert_eq!(truncate_body("short", 16), "short");
        let cut = truncate_body("ééééé", 3);
        assert!(cut.starts_with("é\n"));
        assert!(cut.contains("truncated 8 bytes"));
    }

    #[tokio::test]
    async fn test_rejects_bad_input() {
        let tool = tool();
        assert!(matches!(
            tool.invoke(json!({"method": "GET"})).await,
            Err(ToolError::InvalidInput(_))
        ));
        assert!(matches!(
            tool.invoke(json!({"method": "TRACE", "url": "https://api.weather.gov"})).await,
            Err(ToolError::InvalidInput(_))
        ));
        assert!(matches!(
            tool.invoke(json!({"url": "file:///etc/passwd"})).await,
            Err(ToolError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_get_reports_status_and_sends_user_agent() {
        let (url, server) = serve_once("{\"forecast\":\"sunny\"}").await;

        let output = tool().invoke(json!({"url": url})).await.unwrap();
        assert!(output.starts_with("Status: 200\n\n{\"forecast\":\"sun"));
        assert!(output.contains("truncated"));

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /forecast"));
        assert!(request.to_lowercase().contains("user-agent: conductor-test/1.0"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_http_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        drop(listener);

        assert!(matches!(
            tool().invoke(json!({"url": url})).await,
            Err(ToolError::Http(_))
        ));
    }

    #[test]
    fn test_definition_schema() {
        let def = tool().definition();
        assert_eq!(def.name, HTTP_REQUEST_TOOL);
        assert_eq!(def.input_schema.unwrap()["required"][0], "url");
    }
}
