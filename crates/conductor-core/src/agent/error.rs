//! Agent errors

use thiserror::Error;

use crate::providers::ProviderError;

/// Errors that end a single agent turn
#[derive(Error, Debug)]
pub enum AgentError {
    /// The model backend failed
    #[error("Model backend error: {0}")]
    Model(ProviderError),

    /// The model kept requesting tools past the configured bound
    #[error("Tool call chain exceeded {limit} rounds without a final answer")]
    ToolRoundsExceeded { limit: usize },

    /// The user interrupted the turn
    #[error("Turn cancelled")]
    Cancelled,
}

impl From<ProviderError> for AgentError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Cancelled => AgentError::Cancelled,
            other => AgentError::Model(other),
        }
    }
}

pub type AgentResult<T> = Result<T, AgentError>;
