pub mod api;
pub mod bootstrap;
pub mod health;
pub mod logging;

use axum::Router;
use procura_db::DbPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::AppState;

/// Full HTTP surface: the JSON API plus `/health`.
pub fn app_router(state: AppState, db_pool: DbPool) -> Router {
    api::router(state)
        .merge(health::router(db_pool))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
}
