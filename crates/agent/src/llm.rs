use async_trait::async_trait;
use thiserror::Error;

use procura_core::ports::ExtractionError;

/// One system + user exchange with a chat model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    /// Ask the provider for a bare JSON object.
    pub json_mode: bool,
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("model request failed: {0}")]
    Transport(String),
    #[error("model endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("model response could not be decoded: {0}")]
    Decode(String),
    #[error("model response had no content")]
    Empty,
}

impl From<LlmError> for ExtractionError {
    fn from(value: LlmError) -> Self {
        match value {
            LlmError::Empty => Self::Empty,
            LlmError::Decode(message) => Self::Malformed(message),
            other => Self::Upstream(other.to_string()),
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> Result<String, LlmError>;
}

/// Removes a surrounding Markdown code fence, with or without a language hint.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
