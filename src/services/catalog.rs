use crate::{
    db::MovieRepository,
    error::{AppError, AppResult},
    models::{CatalogStatistics, Movie, MovieId},
};

/// Lists movies, filtered by title when `search` is non-blank
pub async fn list_movies(movies: &dyn MovieRepository, search: Option<&str>) -> AppResult<Vec<Movie>> {
    let filter = search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    movies.list_movies(filter).await
}

pub async fn get_movie(movies: &dyn MovieRepository, id: MovieId) -> AppResult<Movie> {
    movies
        .get_movie(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Movie {} not found", id)))
}

/// Movie counts per year and genre over the whole catalog
pub async fn statistics(movies: &dyn MovieRepository) -> AppResult<CatalogStatistics> {
    let all = movies.list_movies(None).await?;
    Ok(CatalogStatistics::from_movies(&all))
}
