use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Database identifier of a movie
pub type MovieId = i64;

/// A text embedding vector as produced by the embedding provider
pub type Embedding = Vec<f32>;

/// A catalog movie together with its stored embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    pub description: String,
    pub genre: Option<String>,
    pub year: Option<i32>,
    /// Poster image reference
    pub image: Option<String>,
    pub url: Option<String>,
    /// Embedding of `description`, written only by the refresh job
    pub embedding: Option<Embedding>,
    /// When `embedding` was last computed
    pub embedding_updated_at: Option<DateTime<Utc>>,
}

impl Movie {
    /// Creates a movie without genre, year, image or embedding
    pub fn new(id: MovieId, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            genre: None,
            year: None,
            image: None,
            url: None,
            embedding: None,
            embedding_updated_at: None,
        }
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_embedding(mut self, embedding: Embedding, updated_at: DateTime<Utc>) -> Self {
        self.embedding = Some(embedding);
        self.embedding_updated_at = Some(updated_at);
        self
    }

    /// A movie without description text can never be embedded
    pub fn has_description(&self) -> bool {
        !self.description.trim().is_empty()
    }

    pub fn has_embedding(&self) -> bool {
        self.embedding.is_some()
    }

    /// Case-insensitive substring match on title or description
    ///
    /// `needle` must already be lowercased.
    pub fn matches_keyword(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
    }
}
