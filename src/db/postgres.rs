use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::movies::{MovieRepository, RefreshSelection},
    error::AppResult,
    models::{Movie, MovieId},
};

const MOVIE_COLUMNS: &str =
    "id, title, description, genre, year, image, url, embedding, embedding_updated_at";

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the embedded migrations in `migrations/`
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Escapes `%`, `_` and `\` so user input matches literally inside ILIKE
fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// [`MovieRepository`] backed by the `movies` table
#[derive(Clone)]
pub struct PgMovieRepository {
    pool: PgPool,
}

impl PgMovieRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl MovieRepository for PgMovieRepository {
    async fn list_movies(&self, title_filter: Option<String>) -> AppResult<Vec<Movie>> {
        let movies = match title_filter {
            Some(filter) => {
                sqlx::query_as::<_, Movie>(&format!(
                    "SELECT {} FROM movies WHERE title ILIKE $1 ORDER BY id",
                    MOVIE_COLUMNS
                ))
                .bind(like_pattern(&filter))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Movie>(&format!(
                    "SELECT {} FROM movies ORDER BY id",
                    MOVIE_COLUMNS
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(movies)
    }

    async fn get_movie(&self, id: MovieId) -> AppResult<Option<Movie>> {
        let movie = sqlx::query_as::<_, Movie>(&format!(
            "SELECT {} FROM movies WHERE id = $1",
            MOVIE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(movie)
    }

    async fn refresh_candidates(
        &self,
        selection: RefreshSelection,
        limit: usize,
    ) -> AppResult<Vec<Movie>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let movies = match selection {
            RefreshSelection::All => {
                sqlx::query_as::<_, Movie>(&format!(
                    "SELECT {} FROM movies ORDER BY id LIMIT $1",
                    MOVIE_COLUMNS
                ))
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            RefreshSelection::MissingOrStaleBefore(cutoff) => {
                sqlx::query_as::<_, Movie>(&format!(
                    "SELECT {} FROM movies \
                     WHERE embedding IS NULL \
                        OR embedding_updated_at IS NULL \
                        OR embedding_updated_at < $1 \
                     ORDER BY id LIMIT $2",
                    MOVIE_COLUMNS
                ))
                .bind(cutoff)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(movies)
    }

    async fn has_embeddings(&self) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM movies WHERE embedding IS NOT NULL)")
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn movies_with_embeddings(&self) -> AppResult<Vec<Movie>> {
        let movies = sqlx::query_as::<_, Movie>(&format!(
            "SELECT {} FROM movies WHERE embedding IS NOT NULL ORDER BY id",
            MOVIE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(movies)
    }

    async fn keyword_match(&self, needle: &str) -> AppResult<Option<Movie>> {
        let movie = sqlx::query_as::<_, Movie>(&format!(
            "SELECT {} FROM movies \
             WHERE title ILIKE $1 OR description ILIKE $1 \
             ORDER BY id LIMIT 1",
            MOVIE_COLUMNS
        ))
        .bind(like_pattern(needle))
        .fetch_optional(&self.pool)
        .await?;

        Ok(movie)
    }

    async fn save_embedding(
        &self,
        id: MovieId,
        embedding: &[f32],
        updated_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        // Single-row UPDATE: vector and timestamp change together or not at all
        let result = sqlx::query(
            "UPDATE movies SET embedding = $2, embedding_updated_at = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(embedding)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
