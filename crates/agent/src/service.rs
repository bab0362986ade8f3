use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{error, info, warn};

use procura_core::domain::proposal::ProposalSummary;
use procura_core::domain::structured::{ProposalAnalysis, RfpItem, RfpStructure};
use procura_core::ports::{ExtractionError, StructuredExtractor};

use crate::backend::ExtractionBackend;
use crate::llm::{strip_code_fences, ChatRequest};
use crate::prompts;

pub const MOCK_COMPARISON: &str = "Mock comparison: Vendor A is cheapest.";
pub const COMPARISON_FAILED: &str = "Failed to generate comparison.";

/// Bounded-time structured extraction over the configured backend.
#[derive(Clone, Debug)]
pub struct ExtractionService {
    backend: ExtractionBackend,
    budget: Duration,
}

impl ExtractionService {
    pub fn new(backend: ExtractionBackend, budget: Duration) -> Self {
        Self { backend, budget }
    }

    pub fn backend(&self) -> &ExtractionBackend {
        &self.backend
    }

    /// Races the call against the budget. On expiry the pending request is
    /// dropped and never retried.
    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, ExtractionError>>,
    ) -> Result<T, ExtractionError> {
        match tokio::time::timeout(self.budget, call).await {
            Ok(result) => result,
            Err(_) => Err(ExtractionError::Timeout { budget: self.budget }),
        }
    }

    async fn complete_json<T: DeserializeOwned>(
        &self,
        model: &str,
        system: &str,
        user: String,
    ) -> Result<T, ExtractionError> {
        let ExtractionBackend::Model { client, .. } = &self.backend else {
            return Err(ExtractionError::Upstream("no model backend configured".to_string()));
        };
        let request =
            ChatRequest { model: model.to_string(), system: system.to_string(), user, json_mode: true };

        let raw =
            self.bounded(async { client.complete(request).await.map_err(ExtractionError::from) }).await?;
        serde_json::from_str(strip_code_fences(&raw))
            .map_err(|error| ExtractionError::Malformed(error.to_string()))
    }
}

fn log_failure(operation: &'static str, failure: &ExtractionError) {
    match failure {
        ExtractionError::Timeout { budget } => warn!(
            event_name = "extraction.call.timed_out",
            operation,
            budget_ms = budget.as_millis() as u64,
            "extraction exceeded its time budget, using fallback"
        ),
        other => error!(
            event_name = "extraction.call.failed",
            operation,
            error = %other,
            "extraction call failed"
        ),
    }
}

pub fn mock_rfp_structure(text: &str) -> RfpStructure {
    RfpStructure {
        title: Some("Mock RFP Title".to_string()),
        description: Some(text.to_string()),
        items: Some(vec![RfpItem::named("Item 1")]),
        budget: Some(Decimal::from(1_000)),
        ..RfpStructure::default()
    }
}

/// Canned structure used when the model is slow or failing, so drafting never blocks.
pub fn fallback_rfp_structure(text: &str) -> RfpStructure {
    RfpStructure {
        title: Some("Procurement Request (Fallback)".to_string()),
        description: Some(text.to_string()),
        items: Some(vec![RfpItem {
            name: "High-performance Laptops".to_string(),
            quantity: Some(20),
            specs: Some("32GB RAM, 1TB SSD".to_string()),
        }]),
        budget: Some(Decimal::from(50_000)),
        delivery_date: Some("Next Month".to_string()),
        terms: Some(vec!["Standard Warranty".to_string()]),
        ..RfpStructure::default()
    }
}

pub fn mock_proposal_analysis() -> ProposalAnalysis {
    let mut analysis = ProposalAnalysis {
        price: Some(Decimal::ZERO),
        delivery_timeline: Some("Unknown".to_string()),
        ..ProposalAnalysis::default()
    };
    analysis.extra.insert("summary".to_string(), Value::from("Mock analysis"));
    analysis
}

#[async_trait]
impl StructuredExtractor for ExtractionService {
    async fn extract_rfp(&self, prompt: &str) -> RfpStructure {
        let model = match &self.backend {
            ExtractionBackend::Mock => return mock_rfp_structure(prompt),
            ExtractionBackend::Model { model, .. } => model.as_str(),
        };

        match self.complete_json::<RfpStructure>(model, prompts::EXTRACT_RFP, prompt.to_string()).await {
            Ok(mut structure) => {
                if structure.description.is_none() {
                    structure.description = Some(prompt.to_string());
                }
                info!(event_name = "extraction.rfp.extracted", "rfp structure extracted");
                structure
            }
            Err(failure) => {
                log_failure("extract_rfp", &failure);
                fallback_rfp_structure(prompt)
            }
        }
    }

    async fn analyze_proposal(&self, body: &str) -> Result<ProposalAnalysis, ExtractionError> {
        let model = match &self.backend {
            ExtractionBackend::Mock => return Ok(mock_proposal_analysis()),
            ExtractionBackend::Model { model, .. } => model.as_str(),
        };

        let analysis = self
            .complete_json::<ProposalAnalysis>(model, prompts::ANALYZE_PROPOSAL, body.to_string())
            .await
            .and_then(|analysis| {
                if analysis.is_empty() {
                    Err(ExtractionError::Empty)
                } else {
                    Ok(analysis)
                }
            });
        if let Err(failure) = &analysis {
            log_failure("analyze_proposal", failure);
        }
        analysis
    }

    async fn compare(&self, proposals: &[ProposalSummary]) -> String {
        let (client, model) = match &self.backend {
            ExtractionBackend::Mock => return MOCK_COMPARISON.to_string(),
            ExtractionBackend::Model { client, compare_model, .. } => (client, compare_model),
        };

        let user = match serde_json::to_string(proposals) {
            Ok(user) => user,
            Err(error) => {
                log_failure("compare", &ExtractionError::Malformed(error.to_string()));
                return COMPARISON_FAILED.to_string();
            }
        };
        let request = ChatRequest {
            model: model.clone(),
            system: prompts::COMPARE_PROPOSALS.to_string(),
            user,
            json_mode: false,
        };
        match self.bounded(async { client.complete(request).await.map_err(ExtractionError::from) }).await {
            Ok(text) => text,
            Err(failure) => {
                log_failure("compare", &failure);
                COMPARISON_FAILED.to_string()
            }
        }
    }
}
