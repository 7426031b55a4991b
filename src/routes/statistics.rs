use axum::{extract::State, Json};
use std::sync::Arc;

use crate::{
    error::AppResult, models::CatalogStatistics, routes::AppState, services::catalog,
};

/// Handler for catalog statistics
pub async fn summary(State(state): State<Arc<AppState>>) -> AppResult<Json<CatalogStatistics>> {
    let stats = catalog::statistics(state.movies.as_ref()).await?;
    Ok(Json(stats))
}
