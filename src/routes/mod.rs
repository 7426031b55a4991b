use axum::{
    http::StatusCode,
    middleware::from_fn,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    db::MovieRepository,
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    services::RecommendationResolver,
};

pub mod movies;
pub mod recommendations;
pub mod statistics;

/// Shared state handed to every handler
pub struct AppState {
    pub movies: Arc<dyn MovieRepository>,
    pub resolver: Arc<RecommendationResolver>,
}

impl AppState {
    pub fn new(movies: Arc<dyn MovieRepository>, resolver: Arc<RecommendationResolver>) -> Self {
        Self { movies, resolver }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(CorsLayer::permissive())
        .layer(from_fn(request_id_middleware))
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/movies", get(movies::list))
        .route("/movies/:id", get(movies::detail))
        .route("/statistics", get(statistics::summary))
        .route("/recommendations", post(recommendations::recommend))
        .route("/recommendations/:prompt", get(recommendations::recommend_direct))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
