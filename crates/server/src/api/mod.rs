//! JSON surface for RFPs, vendors and the extraction operations.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use procura_core::directory::VendorDirectory;
use procura_core::lifecycle::RfpLifecycleManager;
use procura_core::ports::StructuredExtractor;

pub mod error;
pub mod extraction;
pub mod rfps;
pub mod vendors;

pub use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub lifecycle: RfpLifecycleManager,
    pub directory: VendorDirectory,
    pub extractor: Arc<dyn StructuredExtractor>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/rfps", get(rfps::list).post(rfps::create))
        .route("/api/rfps/{id}", get(rfps::get_one).delete(rfps::delete))
        .route("/api/rfps/{id}/send", post(rfps::send))
        .route("/api/rfps/{id}/check-responses", post(rfps::check_responses))
        .route("/api/rfps/{id}/comparison", get(rfps::comparison))
        .route("/api/rfps/{id}/close", post(rfps::close))
        .route("/api/vendors", get(vendors::list).post(vendors::create))
        .route("/api/vendors/{id}", axum::routing::delete(vendors::delete))
        .route("/api/extraction/extract-structure", post(extraction::extract_structure))
        .route("/api/extraction/parse-proposal", post(extraction::parse_proposal))
        .route("/api/extraction/compare", post(extraction::compare))
        .with_state(state)
}
