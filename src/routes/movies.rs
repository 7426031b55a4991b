use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{Movie, MovieId},
    routes::AppState,
    services::catalog,
};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    search: Option<String>,
}

/// Movie as returned to clients; the embedding itself stays server-side
#[derive(Debug, Serialize)]
pub struct MovieResponse {
    pub id: MovieId,
    pub title: String,
    pub description: String,
    pub genre: Option<String>,
    pub year: Option<i32>,
    pub image: Option<String>,
    pub url: Option<String>,
    pub has_embedding: bool,
    pub embedding_updated_at: Option<DateTime<Utc>>,
}

impl From<&Movie> for MovieResponse {
    fn from(movie: &Movie) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            description: movie.description.clone(),
            genre: movie.genre.clone(),
            year: movie.year,
            image: movie.image.clone(),
            url: movie.url.clone(),
            has_embedding: movie.has_embedding(),
            embedding_updated_at: movie.embedding_updated_at,
        }
    }
}

/// Handler for the movie list, optionally filtered by title
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListQuery>,
) -> AppResult<Json<Vec<MovieResponse>>> {
    let movies = catalog::list_movies(state.movies.as_ref(), params.search.as_deref()).await?;
    Ok(Json(movies.iter().map(MovieResponse::from).collect()))
}

/// Handler for a single movie
pub async fn detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<MovieId>,
) -> AppResult<Json<MovieResponse>> {
    let movie = catalog::get_movie(state.movies.as_ref(), id).await?;
    Ok(Json(MovieResponse::from(&movie)))
}
