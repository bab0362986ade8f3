use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::llm::{ChatRequest, LlmClient, LlmError};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Chat-completions client for OpenAI and API-compatible gateways such as OpenRouter.
#[derive(Clone)]
pub struct OpenAiCompatibleClient {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

/// Picks the endpoint: an explicit base URL wins, OpenRouter keys (`sk-or-`)
/// default to OpenRouter, everything else to OpenAI.
pub fn resolve_base_url(api_key: &str, base_url: Option<&str>) -> String {
    match base_url.map(str::trim).filter(|url| !url.is_empty()) {
        Some(url) => url.trim_end_matches('/').to_string(),
        None if api_key.trim().starts_with("sk-or-") => OPENROUTER_BASE_URL.to_string(),
        None => OPENAI_BASE_URL.to_string(),
    }
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<Value>,
}

impl OpenAiCompatibleClient {
    pub fn new(api_key: SecretString, base_url: Option<&str>) -> Result<Self, LlmError> {
        let base_url = resolve_base_url(api_key.expose_secret(), base_url);
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|error| LlmError::Transport(error.to_string()))?;

        Ok(Self { client, base_url, api_key })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn body(request: &ChatRequest) -> Value {
        let mut body = json!({
            "model": request.model,
            "messages": [
                {"role": "system", "content": request.system},
                {"role": "user", "content": request.user},
            ],
        });
        if request.json_mode {
            body["response_format"] = json!({"type": "json_object"});
        }
        body
    }
}

/// Message content is usually a string; some gateways return content parts.
fn content_text(content: Value) -> Option<String> {
    match content {
        Value::String(text) => Some(text),
        Value::Null => None,
        Value::Array(parts) => {
            let text: String = parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect();
            Some(text)
        }
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatibleClient {
    async fn complete(&self, request: ChatRequest) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key.expose_secret()))
            .header("X-Title", "Procura")
            .json(&Self::body(&request))
            .send()
            .await
            .map_err(|error| LlmError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status { status: status.as_u16(), body });
        }

        let parsed: CompletionResponse =
            response.json().await.map_err(|error| LlmError::Decode(error.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .and_then(content_text)
            .filter(|text| !text.trim().is_empty())
            .ok_or(LlmError::Empty)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{content_text, resolve_base_url, OpenAiCompatibleClient, OPENROUTER_BASE_URL};
    use crate::llm::ChatRequest;

    #[test]
    fn openrouter_keys_default_to_openrouter() {
        assert_eq!(resolve_base_url("sk-or-v1-abc", None), OPENROUTER_BASE_URL);
        assert_eq!(resolve_base_url("sk-proj-abc", None), "https://api.openai.com/v1");
        assert_eq!(
            resolve_base_url("sk-or-v1-abc", Some("http://localhost:11434/v1/")),
            "http://localhost:11434/v1"
        );
    }

    #[test]
    fn json_mode_requests_json_object_format() {
        let body = OpenAiCompatibleClient::body(&ChatRequest {
            model: "gpt-3.5-turbo".to_string(),
            system: "sys".to_string(),
            user: "hello".to_string(),
            json_mode: true,
        });

        assert_eq!(body["response_format"], json!({"type": "json_object"}));
        assert_eq!(body["messages"][1]["content"], "hello");
    }

    #[test]
    fn content_parts_are_concatenated() {
        let parts = json!([{"type": "text", "text": "Vendor A "}, {"type": "text", "text": "wins"}]);
        assert_eq!(content_text(parts).as_deref(), Some("Vendor A wins"));
    }
}
