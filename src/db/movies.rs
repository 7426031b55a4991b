use chrono::{DateTime, Utc};

use crate::{
    error::AppResult,
    models::{Movie, MovieId},
};

/// Which movies a refresh run should consider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshSelection {
    /// Every movie, regardless of its stored embedding
    All,
    /// Movies without an embedding or with one computed before the cutoff
    MissingOrStaleBefore(DateTime<Utc>),
}

impl RefreshSelection {
    pub fn includes(&self, movie: &Movie) -> bool {
        match self {
            RefreshSelection::All => true,
            RefreshSelection::MissingOrStaleBefore(cutoff) => {
                match (&movie.embedding, movie.embedding_updated_at) {
                    (Some(_), Some(updated_at)) => updated_at < *cutoff,
                    _ => true,
                }
            }
        }
    }
}

/// Storage for the movie catalog and its embeddings
///
/// Every list is returned in ascending id order; ranking and keyword
/// fallback rely on that order for deterministic tie-breaks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MovieRepository: Send + Sync {
    /// All movies, optionally filtered by a case-insensitive title substring
    async fn list_movies(&self, title_filter: Option<String>) -> AppResult<Vec<Movie>>;

    async fn get_movie(&self, id: MovieId) -> AppResult<Option<Movie>>;

    /// Up to `limit` movies matching `selection`
    async fn refresh_candidates(
        &self,
        selection: RefreshSelection,
        limit: usize,
    ) -> AppResult<Vec<Movie>>;

    /// Whether any movie has a stored embedding
    async fn has_embeddings(&self) -> AppResult<bool>;

    /// Movies with a non-null embedding
    async fn movies_with_embeddings(&self) -> AppResult<Vec<Movie>>;

    /// First movie whose title or description contains `needle`, ignoring case
    async fn keyword_match(&self, needle: &str) -> AppResult<Option<Movie>>;

    /// Writes one movie's embedding and timestamp together
    ///
    /// Returns `false` when the movie no longer exists.
    async fn save_embedding(
        &self,
        id: MovieId,
        embedding: &[f32],
        updated_at: DateTime<Utc>,
    ) -> AppResult<bool>;
}
