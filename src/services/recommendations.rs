use std::sync::Arc;

use crate::{
    db::MovieRepository,
    error::{AppError, AppResult},
    models::{FallbackReason, Movie, Recommendation, KEYWORD_MATCH_SCORE},
    services::{embeddings::EmbeddingProvider, similarity::cosine_similarity},
};

/// Resolves a free-text prompt to the single best matching movie
///
/// Ranking by embedding similarity is tried first. When the provider is not
/// configured, nothing has been embedded yet, or anything on the semantic
/// path fails, the resolver falls back to a case-insensitive substring
/// search over titles and descriptions.
pub struct RecommendationResolver {
    movies: Arc<dyn MovieRepository>,
    provider: Option<Arc<dyn EmbeddingProvider>>,
}

impl RecommendationResolver {
    /// `provider` is `None` when no credential is configured
    pub fn new(
        movies: Arc<dyn MovieRepository>,
        provider: Option<Arc<dyn EmbeddingProvider>>,
    ) -> Self {
        Self { movies, provider }
    }

    pub fn semantic_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// Recommends a movie for `prompt`
    ///
    /// Only an empty prompt or a failing keyword lookup produce an error;
    /// every problem on the semantic path degrades to keyword search.
    pub async fn recommend(&self, prompt: &str) -> AppResult<Recommendation> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(AppError::InvalidInput(
                "Please enter a search term.".to_string(),
            ));
        }

        let reason = match &self.provider {
            None => FallbackReason::ProviderUnconfigured,
            Some(provider) => match self.rank_by_embedding(provider.as_ref(), prompt).await {
                Ok((movie, score)) => {
                    tracing::info!(movie_id = movie.id, score, "Semantic match found");
                    return Ok(Recommendation::Found { movie, score });
                }
                Err(reason) => reason,
            },
        };

        tracing::info!(reason = %reason, "Falling back to keyword search");
        self.keyword_fallback(prompt, reason).await
    }

    async fn rank_by_embedding(
        &self,
        provider: &dyn EmbeddingProvider,
        prompt: &str,
    ) -> Result<(Movie, f32), FallbackReason> {
        match self.movies.has_embeddings().await {
            Ok(true) => {}
            Ok(false) => return Err(FallbackReason::NoStoredEmbeddings),
            Err(e) => return Err(FallbackReason::StoreUnavailable(e.to_string())),
        }

        let prompt_embedding = provider.embed(prompt).await.map_err(|e| {
            tracing::warn!(error = %e, "Failed to embed prompt");
            FallbackReason::ProviderFailed(e.to_string())
        })?;

        let candidates = self
            .movies
            .movies_with_embeddings()
            .await
            .map_err(|e| FallbackReason::StoreUnavailable(e.to_string()))?;

        best_match(&prompt_embedding, candidates).ok_or(FallbackReason::NoComparableEmbeddings)
    }

    async fn keyword_fallback(
        &self,
        prompt: &str,
        reason: FallbackReason,
    ) -> AppResult<Recommendation> {
        match self.movies.keyword_match(prompt).await? {
            Some(movie) => Ok(Recommendation::Degraded {
                movie,
                score: KEYWORD_MATCH_SCORE,
                reason,
            }),
            None => Ok(Recommendation::NotFound {
                prompt: prompt.to_string(),
                reason: Some(reason),
            }),
        }
    }
}

/// Highest-scoring movie for `query`
///
/// Candidates are scanned in the given order and the first maximum wins.
/// Movies whose stored vector cannot be compared are skipped.
pub fn best_match(
    query: &[f32],
    candidates: impl IntoIterator<Item = Movie>,
) -> Option<(Movie, f32)> {
    let mut best: Option<(Movie, f32)> = None;

    for movie in candidates {
        let Some(embedding) = movie.embedding.as_deref() else {
            continue;
        };

        match cosine_similarity(query, embedding) {
            Ok(score) => {
                if best.as_ref().map_or(true, |(_, top)| score > *top) {
                    best = Some((movie, score));
                }
            }
            Err(e) => {
                tracing::warn!(movie_id = movie.id, error = %e, "Skipping unusable embedding");
            }
        }
    }

    best
}
