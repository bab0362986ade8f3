//! Direct access to the three extraction operations.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use procura_core::domain::proposal::ProposalSummary;
use procura_core::domain::structured::RfpStructure;

use super::rfps::ComparisonResponse;
use super::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ExtractStructureRequest {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseProposalRequest {
    #[serde(default)]
    pub email_body: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CompareRequest {
    #[serde(default)]
    pub proposals: Vec<ProposalSummary>,
}

pub async fn extract_structure(
    State(state): State<AppState>,
    Json(request): Json<ExtractStructureRequest>,
) -> Json<RfpStructure> {
    Json(state.extractor.extract_rfp(&request.prompt).await)
}

/// Answers `{}` when analysis fails.
pub async fn parse_proposal(
    State(state): State<AppState>,
    Json(request): Json<ParseProposalRequest>,
) -> Json<Value> {
    match state.extractor.analyze_proposal(&request.email_body).await {
        Ok(analysis) => Json(serde_json::to_value(analysis).unwrap_or_else(|_| json!({}))),
        Err(error) => {
            warn!(
                event_name = "api.extraction.parse_failed",
                error = %error,
                "proposal analysis failed"
            );
            Json(json!({}))
        }
    }
}

pub async fn compare(
    State(state): State<AppState>,
    Json(request): Json<CompareRequest>,
) -> Json<ComparisonResponse> {
    Json(ComparisonResponse { analysis: state.extractor.compare(&request.proposals).await })
}
