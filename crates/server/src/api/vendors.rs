use axum::extract::{Path, State};
use axum::Json;

use procura_core::domain::vendor::{NewVendor, Vendor, VendorId};

use super::rfps::DeleteResponse;
use super::{ApiError, AppState};

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Vendor>>, ApiError> {
    Ok(Json(state.directory.list().await?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<NewVendor>,
) -> Result<Json<Vendor>, ApiError> {
    Ok(Json(state.directory.create(payload).await?))
}

/// Removes the vendor and its proposals.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    state.directory.delete(&VendorId(id)).await?;
    Ok(Json(DeleteResponse { success: true }))
}
