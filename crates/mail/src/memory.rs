use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::RwLock;

use procura_core::correlation::CorrelationTag;
use procura_core::ports::{InboundEmail, MailTransport, OutboundEmail, TransportError};

#[derive(Default)]
struct Mailbox {
    outbox: Vec<OutboundEmail>,
    inbox: Vec<InboundEmail>,
    failing_recipients: HashSet<String>,
    fetch_failure: Option<String>,
}

/// In-process mailbox. Subject search is case-insensitive, like IMAP `SEARCH SUBJECT`.
#[derive(Default)]
pub struct InMemoryMailbox {
    state: RwLock<Mailbox>,
}

impl InMemoryMailbox {
    pub async fn deliver(&self, email: InboundEmail) {
        self.state.write().await.inbox.push(email);
    }

    pub async fn sent(&self) -> Vec<OutboundEmail> {
        self.state.read().await.outbox.clone()
    }

    /// Sends to this address fail until cleared.
    pub async fn fail_sends_to(&self, address: impl Into<String>) {
        self.state.write().await.failing_recipients.insert(address.into());
    }

    pub async fn fail_fetches(&self, reason: Option<String>) {
        self.state.write().await.fetch_failure = reason;
    }
}

#[async_trait]
impl MailTransport for InMemoryMailbox {
    async fn send(&self, email: OutboundEmail) -> Result<(), TransportError> {
        let mut state = self.state.write().await;
        if state.failing_recipients.contains(&email.to) {
            return Err(TransportError::Rejected {
                status: 550,
                message: format!("mailbox `{}` unavailable", email.to),
            });
        }
        state.outbox.push(email);
        Ok(())
    }

    async fn fetch_responses(
        &self,
        tag: &CorrelationTag,
    ) -> Result<Vec<InboundEmail>, TransportError> {
        let state = self.state.read().await;
        if let Some(reason) = &state.fetch_failure {
            return Err(TransportError::Unavailable(reason.clone()));
        }

        let needle = tag.as_str().to_lowercase();
        Ok(state
            .inbox
            .iter()
            .filter(|email| email.subject.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }
}
