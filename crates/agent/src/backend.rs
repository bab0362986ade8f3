use std::fmt;
use std::sync::Arc;

use procura_core::config::LlmConfig;

use crate::llm::{LlmClient, LlmError};
use crate::openai::OpenAiCompatibleClient;

/// Where extraction requests go. Resolved once at startup.
#[derive(Clone)]
pub enum ExtractionBackend {
    Model { client: Arc<dyn LlmClient>, model: String, compare_model: String },
    Mock,
}

impl ExtractionBackend {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let Some(api_key) = config.api_key.clone().filter(|_| config.has_credentials()) else {
            return Ok(Self::Mock);
        };

        let client = OpenAiCompatibleClient::new(api_key, config.base_url.as_deref())?;
        Ok(Self::Model {
            client: Arc::new(client),
            model: config.model.clone(),
            compare_model: config.compare_model.clone().unwrap_or_else(|| config.model.clone()),
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Model { .. } => "model",
            Self::Mock => "mock",
        }
    }
}

impl fmt::Debug for ExtractionBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model { model, compare_model, .. } => f
                .debug_struct("Model")
                .field("model", model)
                .field("compare_model", compare_model)
                .finish_non_exhaustive(),
            Self::Mock => f.write_str("Mock"),
        }
    }
}
