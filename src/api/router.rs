//! Analytics API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.
//!
//! Middleware stack (outermost → innermost):
//! 1. Access log → 2. CORS → handler

use std::sync::Arc;

use axum::http::{Method, Uri};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::api::endpoints;
use crate::api::error::ApiError;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::store::RowStore;

/// Build the analytics router over `store`.
pub fn analytics_router(store: Arc<dyn RowStore>) -> Router {
    build_router(ApiContext::new(store))
}

fn build_router(ctx: ApiContext) -> Router {
    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/reports", get(endpoints::reports::generate))
        .with_state(ctx);

    // Reports are read-only, so any origin may call them.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .nest("/api", api)
        .fallback(not_found)
        .layer(cors)
        .layer(axum::middleware::from_fn(middleware::access_log::log_access))
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}
