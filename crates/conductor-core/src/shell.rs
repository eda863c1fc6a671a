//! Interactive shell
//!
//! Reads one line at a time, hands it to a `TurnHandler` and prints the
//! answer. Generic over the reader and writer so tests can drive it with
//! in-memory buffers.

use std::io::ErrorKind;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::agent::{Agent, AgentError, AgentResult};
use crate::types::CancellationToken;

const RED: &str = "\x1b[31m";
const BLUE: &str = "\x1b[34m";
const RESET: &str = "\x1b[0m";

const TITLE: &str = "Conductor Agents Demonstration";

/// Something that turns one user input into one answer
#[async_trait]
pub trait TurnHandler: Send {
    async fn handle(&mut self, input: &str, cancel: &CancellationToken) -> AgentResult<String>;
}

#[async_trait]
impl TurnHandler for Agent {
    async fn handle(&mut self, input: &str, cancel: &CancellationToken) -> AgentResult<String> {
        self.run(input, cancel).await
    }
}

/// How the shell loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellExit {
    /// `exit`, `quit` or end of input
    Quit,
    /// The cancellation token fired
    Interrupted,
}

/// Line-oriented front end for an agent
pub struct Shell<R, W> {
    input: R,
    output: W,
    cancel: CancellationToken,
    colors: bool,
}

impl<R, W> Shell<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(input: R, output: W, cancel: CancellationToken) -> Self {
        Self {
            input,
            output,
            cancel,
            colors: true,
        }
    }

    /// Toggle ANSI colours
    pub fn with_colors(mut self, colors: bool) -> Self {
        self.colors = colors;
        self
    }

    /// Give back the writer (tests read what was printed)
    pub fn into_output(self) -> W {
        self.output
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.colors {
            format!("{}{}{}", color, text, RESET)
        } else {
            text.to_string()
        }
    }

    async fn write(&mut self, text: &str) -> std::io::Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await
    }

    async fn interrupted(&mut self) -> std::io::Result<ShellExit> {
        let line = self.paint(RED, "Execution interrupted. Exiting...");
        self.write(&format!("\n\n{}\n", line)).await?;
        Ok(ShellExit::Interrupted)
    }

    async fn report(&mut self, err: &dyn std::fmt::Display) -> std::io::Result<()> {
        let report = format!(
            "\n{}\n{}\n",
            self.paint(RED, &format!("An error occurred: {}", err)),
            self.paint(RED, "Please try a different request.")
        );
        self.write(&report).await
    }

    async fn goodbye(&mut self) -> std::io::Result<ShellExit> {
        let line = self.paint(BLUE, "Goodbye! 👋");
        self.write(&format!("\n{}\n", line)).await?;
        Ok(ShellExit::Quit)
    }

    /// Run until quit, end of input or interrupt
    ///
    /// Turn failures and undecodable input lines are printed and the loop
    /// carries on; only stream failures end it with an error.
    pub async fn run(&mut self, handler: &mut dyn TurnHandler) -> std::io::Result<ShellExit> {
        let banner = format!(
            "\n{}\n\n{}\n",
            self.paint(BLUE, TITLE),
            self.paint(BLUE, "Type your request (or 'exit' to quit):")
        );
        self.write(&banner).await?;

        let cancel = self.cancel.clone();
        let mut line = String::new();

        loop {
            let prompt = self.paint(BLUE, "> ");
            self.write(&format!("\n{}", prompt)).await?;

            line.clear();
            let read = tokio::select! {
                _ = cancel.cancelled() => return self.interrupted().await,
                read = self.input.read_line(&mut line) => read,
            };

            // read_line consumes the whole line before rejecting it as non UTF-8
            let read = match read {
                Ok(read) => read,
                Err(e) if e.kind() == ErrorKind::InvalidData => {
                    self.report(&e).await?;
                    continue;
                }
                Err(e) => return Err(e),
            };

            if read == 0 {
                return self.goodbye().await;
            }

            let request = line.trim();
            if request.eq_ignore_ascii_case("exit") || request.eq_ignore_ascii_case("quit") {
                return self.goodbye().await;
            }
            if request.is_empty() {
                continue;
            }

            let outcome = tokio::select! {
                _ = cancel.cancelled() => Err(AgentError::Cancelled),
                outcome = handler.handle(request, &cancel) => outcome,
            };

            match outcome {
                Ok(answer) => self.write(&format!("\n{}\n", answer)).await?,
                Err(AgentError::Cancelled) => return self.interrupted().await,
                Err(e) => self.report(&e).await?,
            }
        }
    }
}
