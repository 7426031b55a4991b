use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use crate::{
    db::{MovieRepository, RefreshSelection},
    error::AppResult,
    models::{Movie, RefreshOutcome, RefreshReport, SkipReason},
    services::{embeddings::EmbeddingProvider, pacing::RateLimiter},
};

/// Recomputes missing or stale movie embeddings
///
/// Movies are handled one at a time: each provider call waits on the rate
/// limiter, and each successful embedding is committed before the next
/// movie is touched. One movie failing never stops the run.
pub struct EmbeddingRefreshJob {
    movies: Arc<dyn MovieRepository>,
    provider: Arc<dyn EmbeddingProvider>,
    limiter: Arc<dyn RateLimiter>,
    staleness: chrono::Duration,
}

impl EmbeddingRefreshJob {
    pub fn new(
        movies: Arc<dyn MovieRepository>,
        provider: Arc<dyn EmbeddingProvider>,
        limiter: Arc<dyn RateLimiter>,
        staleness: chrono::Duration,
    ) -> Self {
        Self {
            movies,
            provider,
            limiter,
            staleness,
        }
    }

    /// Refreshes at most `max_per_run` movies
    ///
    /// With `force_update` every movie is eligible, otherwise only those
    /// whose embedding is missing or older than the staleness threshold.
    /// Fails only when the candidate list cannot be read, before any write.
    #[instrument(skip(self))]
    pub async fn refresh(&self, max_per_run: usize, force_update: bool) -> AppResult<RefreshReport> {
        let selection = if force_update {
            RefreshSelection::All
        } else {
            RefreshSelection::MissingOrStaleBefore(Utc::now() - self.staleness)
        };

        let candidates = self
            .movies
            .refresh_candidates(selection, max_per_run)
            .await?;

        tracing::info!(
            candidates = candidates.len(),
            "Starting embedding refresh"
        );

        let mut report = RefreshReport::default();

        for movie in candidates.into_iter().take(max_per_run) {
            let outcome = self.refresh_movie(&movie).await;

            match &outcome {
                RefreshOutcome::Updated => {
                    tracing::info!(movie_id = movie.id, title = %movie.title, "Updated embedding");
                }
                RefreshOutcome::Skipped(reason) => {
                    tracing::warn!(movie_id = movie.id, title = %movie.title, reason = %reason, "Skipping movie");
                }
                RefreshOutcome::Failed(error) => {
                    tracing::error!(movie_id = movie.id, title = %movie.title, error = %error, "Failed to refresh embedding");
                }
            }

            report.record(movie.id, &movie.title, outcome);
        }

        tracing::info!(
            selected = report.selected(),
            updated = report.updated(),
            skipped = report.skipped(),
            failed = report.failed(),
            "Completed embedding refresh"
        );

        Ok(report)
    }

    async fn refresh_movie(&self, movie: &Movie) -> RefreshOutcome {
        if !movie.has_description() {
            return RefreshOutcome::Skipped(SkipReason::EmptyDescription);
        }

        self.limiter.acquire().await;

        let embedding = match self.provider.embed(&movie.description).await {
            Ok(embedding) => embedding,
            Err(e) => return RefreshOutcome::Failed(e.to_string()),
        };

        match self
            .movies
            .save_embedding(movie.id, &embedding, Utc::now())
            .await
        {
            Ok(true) => RefreshOutcome::Updated,
            Ok(false) => RefreshOutcome::Failed("movie no longer exists".to_string()),
            Err(e) => RefreshOutcome::Failed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::db::movies::MockMovieRepository;
    use crate::db::InMemoryMovieRepository;
    use crate::error::AppError;
    use crate::services::embeddings::MockEmbeddingProvider;
    use crate::services::pacing::NoopLimiter;

    #[derive(Default)]
    struct CountingLimiter {
        permits: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl RateLimiter for CountingLimiter {
        async fn acquire(&self) {
            self.permits.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn job(
        movies: Arc<dyn MovieRepository>,
        provider: MockEmbeddingProvider,
    ) -> EmbeddingRefreshJob {
        EmbeddingRefreshJob::new(
            movies,
            Arc::new(provider),
            Arc::new(NoopLimiter),
            chrono::Duration::days(30),
        )
    }

    fn provider_returning(embedding: Vec<f32>) -> MockEmbeddingProvider {
        let mut provider = MockEmbeddingProvider::new();
        provider
            .expect_embed()
            .returning(move |_| Ok(embedding.clone()));
        provider
    }

    #[tokio::test]
    async fn test_empty_description_is_skipped_without_provider_call() {
        let repo = Arc::new(InMemoryMovieRepository::new(vec![Movie::new(1, "Untitled", "")]));
        let mut provider = MockEmbeddingProvider::new();
        provider.expect_embed().never();

        let report = job(repo.clone(), provider).refresh(10, false).await.unwrap();

        assert_eq!(report.updated(), 0);
        assert_eq!(report.skipped(), 1);
        assert_eq!(
            report.entries[0].outcome,
            RefreshOutcome::Skipped(SkipReason::EmptyDescription)
        );
        let movie = repo.get_movie(1).await.unwrap().unwrap();
        assert!(movie.embedding.is_none());
        assert!(movie.embedding_updated_at.is_none());
    }

    #[tokio::test]
    async fn test_never_processes_more_than_max_per_run() {
        let repo = Arc::new(InMemoryMovieRepository::new(
            (1..=5).map(|id| Movie::new(id, format!("Movie {}", id), "Some plot")),
        ));
        let mut provider = MockEmbeddingProvider::new();
        provider
            .expect_embed()
            .times(2)
            .returning(|_| Ok(vec![1.0, 0.0]));

        let report = job(repo.clone(), provider).refresh(2, false).await.unwrap();

        assert_eq!(report.selected(), 2);
        assert_eq!(report.updated(), 2);
        assert_eq!(repo.movies_with_embeddings().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_zero_max_per_run_does_nothing() {
        let repo = Arc::new(InMemoryMovieRepository::new(vec![Movie::new(1, "Batman", "Gotham")]));
        let mut provider = MockEmbeddingProvider::new();
        provider.expect_embed().never();

        let report = job(repo, provider).refresh(0, true).await.unwrap();
        assert_eq!(report.selected(), 0);
    }

    #[tokio::test]
    async fn test_force_update_refreshes_fresh_embeddings() {
        let yesterday = Utc::now() - chrono::Duration::days(1);
        let repo = Arc::new(InMemoryMovieRepository::new(vec![
            Movie::new(1, "Batman", "A superhero fights crime in Gotham")
                .with_embedding(vec![0.0, 1.0], yesterday),
            Movie::new(2, "Lego Movie", "An animated adventure")
                .with_embedding(vec![0.0, 1.0], yesterday),
            Movie::new(3, "Untitled", ""),
        ]));

        let report = job(repo.clone(), provider_returning(vec![1.0, 0.0]))
            .refresh(10, true)
            .await
            .unwrap();

        assert_eq!(report.updated(), 2);
        assert_eq!(report.skipped(), 1);
        for id in [1, 2] {
            let movie = repo.get_movie(id).await.unwrap().unwrap();
            assert_eq!(movie.embedding, Some(vec![1.0, 0.0]));
            assert!(movie.embedding_updated_at.unwrap() > yesterday);
        }
    }

    #[tokio::test]
    async fn test_fresh_embeddings_are_skipped_without_force() {
        let now = Utc::now();
        let repo = Arc::new(InMemoryMovieRepository::new(vec![
            Movie::new(1, "Batman", "A superhero fights crime in Gotham")
                .with_embedding(vec![0.0, 1.0], now - chrono::Duration::days(2)),
            Movie::new(2, "Lego Movie", "An animated adventure")
                .with_embedding(vec![0.0, 1.0], now - chrono::Duration::days(40)),
            Movie::new(3, "Inception", "Dreams within dreams"),
        ]));
        let mut provider = MockEmbeddingProvider::new();
        provider
            .expect_embed()
            .withf(|text| text != "A superhero fights crime in Gotham")
            .times(2)
            .returning(|_| Ok(vec![1.0, 0.0]));

        let report = job(repo.clone(), provider).refresh(10, false).await.unwrap();

        let refreshed: Vec<_> = report.entries.iter().map(|e| e.movie_id).collect();
        assert_eq!(refreshed, vec![2, 3]);
        let batman = repo.get_movie(1).await.unwrap().unwrap();
        assert_eq!(batman.embedding, Some(vec![0.0, 1.0]));
    }

    #[tokio::test]
    async fn test_provider_failure_does_not_abort_run() {
        let repo = Arc::new(InMemoryMovieRepository::new(vec![
            Movie::new(1, "Batman", "A superhero fights crime in Gotham"),
            Movie::new(2, "Lego Movie", "An animated adventure"),
            Movie::new(3, "Inception", "Dreams within dreams"),
        ]));
        let mut provider = MockEmbeddingProvider::new();
        provider.expect_embed().returning(|text| {
            if text == "An animated adventure" {
                Err(AppError::ExternalApi("rate limited".to_string()))
            } else {
                Ok(vec![1.0, 0.0])
            }
        });

        let report = job(repo.clone(), provider).refresh(10, false).await.unwrap();

        assert_eq!(report.updated(), 2);
        assert_eq!(report.failed(), 1);
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, 2);
        assert!(failures[0].1.contains("rate limited"));
        assert!(repo.get_movie(3).await.unwrap().unwrap().has_embedding());
        assert!(!repo.get_movie(2).await.unwrap().unwrap().has_embedding());
    }

    #[tokio::test]
    async fn test_save_failure_is_recorded() {
        let mut repo = MockMovieRepository::new();
        repo.expect_refresh_candidates()
            .returning(|_, _| Ok(vec![Movie::new(7, "Batman", "Gotham")]));
        repo.expect_save_embedding()
            .returning(|_, _, _| Err(AppError::Internal("disk full".to_string())));

        let report = job(Arc::new(repo), provider_returning(vec![1.0]))
            .refresh(10, false)
            .await
            .unwrap();

        assert_eq!(report.updated(), 0);
        assert_eq!(report.failures().next().map(|(id, _)| id), Some(7));
    }

    #[tokio::test]
    async fn test_candidate_read_failure_aborts_before_provider_calls() {
        let mut repo = MockMovieRepository::new();
        repo.expect_refresh_candidates()
            .returning(|_, _| Err(AppError::Internal("connection reset".to_string())));
        let mut provider = MockEmbeddingProvider::new();
        provider.expect_embed().never();

        let result = job(Arc::new(repo), provider).refresh(10, false).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_limiter_paces_each_provider_call() {
        let repo = Arc::new(InMemoryMovieRepository::new(vec![
            Movie::new(1, "Batman", "A superhero fights crime in Gotham"),
            Movie::new(2, "Untitled", ""),
            Movie::new(3, "Inception", "Dreams within dreams"),
        ]));
        let limiter = Arc::new(CountingLimiter::default());
        let job = EmbeddingRefreshJob::new(
            repo,
            Arc::new(provider_returning(vec![1.0])),
            limiter.clone(),
            chrono::Duration::days(30),
        );

        job.refresh(10, false).await.unwrap();

        assert_eq!(limiter.permits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_selection_uses_staleness_threshold() {
        let mut repo = MockMovieRepository::new();
        repo.expect_refresh_candidates()
            .withf(|selection, limit| {
                let expected = Utc::now() - chrono::Duration::days(30);
                *limit == 20
                    && matches!(selection, RefreshSelection::MissingOrStaleBefore(cutoff)
                        if (*cutoff - expected).num_seconds().abs() < 5)
            })
            .returning(|_, _| Ok(vec![]));
        let mut provider = MockEmbeddingProvider::new();
        provider.expect_embed().never();

        let report = job(Arc::new(repo), provider).refresh(20, false).await.unwrap();
        assert_eq!(report, RefreshReport::default());
    }
}
