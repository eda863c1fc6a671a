//! Logger backed by the `tracing` crate
//!
//! The binary installs a `tracing-subscriber` that writes to stderr, so
//! component logs never interleave with the interactive prompt on stdout.

use super::traits::Logger;

/// Forwards every message to `tracing` with a `component` field
#[derive(Debug, Clone)]
pub struct TracingLogger {
    component: String,
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new("conductor")
    }
}

impl TracingLogger {
    /// Create a logger tagging events with the given component name
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
        }
    }

    /// Component name attached to every event
    pub fn component(&self) -> &str {
        &self.component
    }
}

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "conductor", component = %self.component, "{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!(target: "conductor", component = %self.component, "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "conductor", component = %self.component, "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "conductor", component = %self.component, "{}", message);
    }
}
