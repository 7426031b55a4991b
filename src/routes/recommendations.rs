use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::Recommendation,
    routes::{movies::MovieResponse, AppState},
};

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    pub prompt: String,
}

/// The three presentable outcomes of a recommendation
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecommendationResponse {
    Found {
        movie: MovieResponse,
        score: f32,
    },
    Degraded {
        movie: MovieResponse,
        score: f32,
        note: String,
    },
    NotFound {
        prompt: String,
        message: String,
    },
}

impl From<&Recommendation> for RecommendationResponse {
    fn from(rec: &Recommendation) -> Self {
        match rec {
            Recommendation::Found { movie, score } => Self::Found {
                movie: MovieResponse::from(movie),
                score: *score,
            },
            Recommendation::Degraded { movie, score, .. } => Self::Degraded {
                movie: MovieResponse::from(movie),
                score: *score,
                note: rec.message().unwrap_or_default(),
            },
            Recommendation::NotFound { prompt, .. } => Self::NotFound {
                prompt: prompt.clone(),
                message: rec.message().unwrap_or_default(),
            },
        }
    }
}

/// Handler for recommendations endpoint
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<RecommendationResponse>> {
    resolve(&state, &request_id, &request.prompt).await
}

/// Handler for recommendations with the prompt taken from the path
pub async fn recommend_direct(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(prompt): Path<String>,
) -> AppResult<Json<RecommendationResponse>> {
    resolve(&state, &request_id, &prompt).await
}

async fn resolve(
    state: &AppState,
    request_id: &RequestId,
    prompt: &str,
) -> AppResult<Json<RecommendationResponse>> {
    tracing::info!(
        request_id = %request_id,
        semantic = state.resolver.semantic_enabled(),
        "Processing recommendation request"
    );

    let recommendation = state.resolver.recommend(prompt).await?;
    let response = RecommendationResponse::from(&recommendation);

    tracing::info!(
        request_id = %request_id,
        movie_id = recommendation.movie().map(|m| m.id),
        score = recommendation.score(),
        "Recommendation completed"
    );

    Ok(Json(response))
}
