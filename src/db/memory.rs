use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    db::movies::{MovieRepository, RefreshSelection},
    error::AppResult,
    models::{Movie, MovieId},
};

/// In-memory movie store for development and testing.
///
/// Movies are kept in a `BTreeMap` so iteration follows ascending ids, the
/// same order the Postgres repository returns.
#[derive(Default)]
pub struct InMemoryMovieRepository {
    movies: RwLock<BTreeMap<MovieId, Movie>>,
}

impl InMemoryMovieRepository {
    pub fn new(movies: impl IntoIterator<Item = Movie>) -> Self {
        Self {
            movies: RwLock::new(movies.into_iter().map(|m| (m.id, m)).collect()),
        }
    }

    /// Inserts or replaces a movie
    pub async fn insert(&self, movie: Movie) {
        self.movies.write().await.insert(movie.id, movie);
    }
}

#[async_trait::async_trait]
impl MovieRepository for InMemoryMovieRepository {
    async fn list_movies(&self, title_filter: Option<String>) -> AppResult<Vec<Movie>> {
        let filter = title_filter.map(|f| f.to_lowercase());
        let movies = self.movies.read().await;

        Ok(movies
            .values()
            .filter(|m| match &filter {
                Some(f) => m.title.to_lowercase().contains(f),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn get_movie(&self, id: MovieId) -> AppResult<Option<Movie>> {
        Ok(self.movies.read().await.get(&id).cloned())
    }

    async fn refresh_candidates(
        &self,
        selection: RefreshSelection,
        limit: usize,
    ) -> AppResult<Vec<Movie>> {
        let movies = self.movies.read().await;

        Ok(movies
            .values()
            .filter(|m| selection.includes(m))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn has_embeddings(&self) -> AppResult<bool> {
        Ok(self.movies.read().await.values().any(Movie::has_embedding))
    }

    async fn movies_with_embeddings(&self) -> AppResult<Vec<Movie>> {
        let movies = self.movies.read().await;
        Ok(movies.values().filter(|m| m.has_embedding()).cloned().collect())
    }

    async fn keyword_match(&self, needle: &str) -> AppResult<Option<Movie>> {
        let needle = needle.to_lowercase();
        let movies = self.movies.read().await;
        Ok(movies.values().find(|m| m.matches_keyword(&needle)).cloned())
    }

    async fn save_embedding(
        &self,
        id: MovieId,
        embedding: &[f32],
        updated_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut movies = self.movies.write().await;

        match movies.get_mut(&id) {
            Some(movie) => {
                movie.embedding = Some(embedding.to_vec());
                movie.embedding_updated_at = Some(updated_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> InMemoryMovieRepository {
        let now = Utc::now();
        InMemoryMovieRepository::new(vec![
            Movie::new(3, "The Dark Knight", "Batman faces the Joker")
                .with_embedding(vec![0.1, 0.9], now),
            Movie::new(1, "Batman", "A superhero fights crime in Gotham"),
            Movie::new(2, "Lego Movie", "An animated adventure"),
        ])
    }

    #[tokio::test]
    async fn test_list_movies_ordered_by_id() {
        let repo = catalog();
        let ids: Vec<MovieId> = repo
            .list_movies(None)
            .await
            .unwrap()
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_list_movies_title_filter_ignores_case() {
        let repo = catalog();
        let movies = repo.list_movies(Some("BAT".to_string())).await.unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].title, "Batman");
    }

    #[tokio::test]
    async fn test_keyword_match_returns_lowest_id() {
        let repo = catalog();
        let movie = repo.keyword_match("batman").await.unwrap().unwrap();
        assert_eq!(movie.id, 1);
    }

    #[tokio::test]
    async fn test_keyword_match_searches_description() {
        let repo = catalog();
        let movie = repo.keyword_match("ANIMATED").await.unwrap().unwrap();
        assert_eq!(movie.title, "Lego Movie");
    }

    #[tokio::test]
    async fn test_refresh_candidates_respects_limit() {
        let repo = catalog();
        let movies = repo
            .refresh_candidates(RefreshSelection::All, 2)
            .await
            .unwrap();
        assert_eq!(movies.len(), 2);
    }

    #[tokio::test]
    async fn test_save_embedding_sets_vector_and_timestamp() {
        let repo = catalog();
        let now = Utc::now();

        assert_eq!(repo.movies_with_embeddings().await.unwrap().len(), 1);
        assert!(repo.save_embedding(1, &[0.5, 0.5], now).await.unwrap());

        let movie = repo.get_movie(1).await.unwrap().unwrap();
        assert_eq!(movie.embedding, Some(vec![0.5, 0.5]));
        assert_eq!(movie.embedding_updated_at, Some(now));
        assert_eq!(repo.movies_with_embeddings().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_save_embedding_unknown_movie() {
        let repo = catalog();
        assert!(!repo.save_embedding(42, &[1.0], Utc::now()).await.unwrap());
    }
}
