//! Movie reviews recommendation service
//!
//! # Commands
//!
//! ```bash
//! # Serve the HTTP API with scheduled embedding refresh
//! moviereviews serve
//!
//! # Embed missing or stale movie descriptions once
//! moviereviews compute-embeddings --max-per-run 50
//!
//! # Compare two movies against a prompt
//! moviereviews compare --movie1 Batman --movie2 "Lego Movie" --prompt "heist thriller"
//! ```

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use moviereviews_api::{
    config::Config,
    db::{create_pool, create_redis_client, run_migrations, Cache, MovieRepository, PgMovieRepository},
    routes::{create_router, AppState},
    services::{
        compare::compare_with_prompt,
        embeddings::{CachedEmbeddingProvider, EmbeddingProvider, OpenAiEmbeddingProvider},
        pacing::QuotaLimiter,
        scheduler::spawn_refresh_schedule,
        EmbeddingRefreshJob, RecommendationResolver,
    },
};

#[derive(Parser)]
#[command(name = "moviereviews")]
#[command(about = "Semantic movie recommendations from review descriptions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API and run the refresh schedule
    Serve,

    /// Compute embeddings for movies that are missing one or have a stale one
    ComputeEmbeddings {
        /// Re-embed every movie regardless of age
        #[arg(long)]
        force: bool,

        /// Maximum number of movies to embed in this run
        #[arg(long)]
        max_per_run: Option<usize>,
    },

    /// Compare two movies with each other and with a prompt
    Compare {
        #[arg(long, default_value = "Batman")]
        movie1: String,

        #[arg(long, default_value = "Lego Movie")]
        movie2: String,

        #[arg(long, default_value = "superhero movie with action and adventure")]
        prompt: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("moviereviews_api=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Serve => serve(config).await,
        Commands::ComputeEmbeddings { force, max_per_run } => {
            compute_embeddings(config, force, max_per_run).await
        }
        Commands::Compare {
            movie1,
            movie2,
            prompt,
        } => compare(config, &movie1, &movie2, &prompt).await,
    }
}

async fn connect_catalog(config: &Config) -> Result<Arc<PgMovieRepository>> {
    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;
    Ok(Arc::new(PgMovieRepository::new(pool)))
}

async fn serve(config: Config) -> Result<()> {
    let movies = connect_catalog(&config).await?;

    let provider = match OpenAiEmbeddingProvider::from_config(&config) {
        Ok(provider) => Some(provider),
        Err(e) => {
            tracing::warn!(error = %e, "Semantic search disabled, serving keyword matches only");
            None
        }
    };

    let redis_client = create_redis_client(&config.redis_url)?;
    let (cache, cache_handle) = Cache::new(redis_client, config.cache_timeout()).await;

    let prompt_provider = provider.clone().map(|p| {
        let model = p.model().to_string();
        Arc::new(CachedEmbeddingProvider::new(p, cache, model, config.prompt_cache_ttl_secs))
            as Arc<dyn EmbeddingProvider>
    });

    let schedule = provider.map(|p| {
        let job = EmbeddingRefreshJob::new(
            movies.clone(),
            Arc::new(p),
            Arc::new(QuotaLimiter::per_interval(config.refresh_pacing())),
            config.staleness_threshold(),
        );
        spawn_refresh_schedule(
            Arc::new(job),
            config.refresh_interval(),
            config.refresh_max_per_run,
        )
    });

    let resolver = RecommendationResolver::new(movies.clone(), prompt_provider);
    let state = Arc::new(AppState::new(movies, Arc::new(resolver)));
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(schedule) = schedule {
        schedule.shutdown().await;
    }
    cache_handle.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}

async fn compute_embeddings(config: Config, force: bool, max_per_run: Option<usize>) -> Result<()> {
    // Credential first: a missing key must not cost a database connection
    let provider = OpenAiEmbeddingProvider::from_config(&config)?;
    let movies = connect_catalog(&config).await?;

    let job = EmbeddingRefreshJob::new(
        movies,
        Arc::new(provider),
        Arc::new(QuotaLimiter::per_interval(config.refresh_pacing())),
        config.staleness_threshold(),
    );

    let limit = max_per_run.unwrap_or(config.refresh_max_per_run);
    let report = job.refresh(limit, force).await?;

    println!(
        "Processed {} movies: {} updated, {} skipped, {} failed",
        report.selected(),
        report.updated(),
        report.skipped(),
        report.failed()
    );
    for (movie_id, error) in report.failures() {
        println!("  movie {}: {}", movie_id, error);
    }

    Ok(())
}

async fn compare(config: Config, movie1: &str, movie2: &str, prompt: &str) -> Result<()> {
    let provider = OpenAiEmbeddingProvider::from_config(&config)?;
    let movies = connect_catalog(&config).await?;
    let movies: &dyn MovieRepository = movies.as_ref();

    println!("Looking for movies: '{}' and '{}'", movie1, movie2);
    let comparison = compare_with_prompt(movies, &provider, movie1, movie2, prompt).await?;

    println!("Movie 1: {}", comparison.first.title);
    println!("Movie 2: {}", comparison.second.title);
    println!(
        "{} vs {}: {:.4}",
        comparison.first.title, comparison.second.title, comparison.between_movies
    );
    println!(
        "Prompt vs '{}': {:.4}",
        comparison.first.title, comparison.first_to_prompt
    );
    println!(
        "Prompt vs '{}': {:.4}",
        comparison.second.title, comparison.second_to_prompt
    );
    println!(
        "'{}' is closer to the prompt '{}'",
        comparison.closer_to_prompt().title,
        prompt
    );

    Ok(())
}
