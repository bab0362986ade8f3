use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use procura_core::domain::proposal::Proposal;
use procura_core::domain::rfp::{Rfp, RfpDetail, RfpId, RfpSummary};
use procura_core::domain::vendor::VendorId;

use super::{ApiError, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct CreateRfpRequest {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    #[serde(default)]
    pub vendor_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub success: bool,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct CheckResponsesResponse {
    pub count: usize,
    pub proposals: Vec<Proposal>,
}

#[derive(Debug, Serialize)]
pub struct ComparisonResponse {
    pub analysis: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateRfpRequest>,
) -> Result<Json<Rfp>, ApiError> {
    Ok(Json(state.lifecycle.create_rfp(&request.prompt).await?))
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<RfpSummary>>, ApiError> {
    Ok(Json(state.lifecycle.list().await?))
}

/// Answers `null` rather than 404 for an unknown id.
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Option<RfpDetail>>, ApiError> {
    Ok(Json(state.lifecycle.get(&RfpId(id)).await?))
}

pub async fn send(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SendRequest>,
) -> Result<Json<SendResponse>, ApiError> {
    let vendor_ids: Vec<VendorId> = request.vendor_ids.into_iter().map(VendorId).collect();
    let report = state.lifecycle.send(&RfpId(id), &vendor_ids).await?;
    Ok(Json(SendResponse { success: true, count: report.count }))
}

pub async fn check_responses(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CheckResponsesResponse>, ApiError> {
    let report = state.lifecycle.check_responses(&RfpId(id)).await?;
    Ok(Json(CheckResponsesResponse { count: report.count, proposals: report.proposals }))
}

pub async fn comparison(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ComparisonResponse>, ApiError> {
    let analysis = state.lifecycle.compare(&RfpId(id)).await?;
    Ok(Json(ComparisonResponse { analysis }))
}

pub async fn close(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Rfp>, ApiError> {
    Ok(Json(state.lifecycle.close(&RfpId(id)).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    state.lifecycle.delete(&RfpId(id)).await?;
    Ok(Json(DeleteResponse { success: true }))
}
