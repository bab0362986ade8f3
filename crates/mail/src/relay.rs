use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::debug;

use procura_core::correlation::CorrelationTag;
use procura_core::ports::{InboundEmail, MailTransport, OutboundEmail, TransportError};

/// Client for a mail relay exposing `POST /send` and `GET /fetch-responses`.
#[derive(Clone)]
pub struct HttpRelayTransport {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct RelayMessage {
    #[serde(default)]
    from: String,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    body: String,
}

impl HttpRelayTransport {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()
            .map_err(|error| TransportError::Unavailable(error.to_string()))?;

        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

async fn ensure_success(response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(TransportError::Rejected { status: status.as_u16(), message })
}

#[async_trait]
impl MailTransport for HttpRelayTransport {
    async fn send(&self, email: OutboundEmail) -> Result<(), TransportError> {
        let response = self
            .client
            .post(format!("{}/send", self.base_url))
            .json(&email)
            .send()
            .await
            .map_err(|error| TransportError::Unavailable(error.to_string()))?;
        ensure_success(response).await?;

        debug!(event_name = "mail.relay.sent", to = %email.to, "relay accepted message");
        Ok(())
    }

    async fn fetch_responses(
        &self,
        tag: &CorrelationTag,
    ) -> Result<Vec<InboundEmail>, TransportError> {
        let response = self
            .client
            .get(format!("{}/fetch-responses", self.base_url))
            .query(&[("rfpId", tag.rfp_id().0.as_str()), ("subject", tag.as_str())])
            .send()
            .await
            .map_err(|error| TransportError::Unavailable(error.to_string()))?;
        let messages: Vec<RelayMessage> = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|error| TransportError::Malformed(error.to_string()))?;

        debug!(
            event_name = "mail.relay.fetched",
            rfp_id = %tag.rfp_id(),
            messages = messages.len(),
            "relay returned tagged messages"
        );
        Ok(messages
            .into_iter()
            .map(|message| InboundEmail {
                from: message.from,
                subject: message.subject,
                body: message.body,
            })
            .collect())
    }
}
