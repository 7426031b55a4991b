//! Text embedding provider abstraction
//!
//! The refresh job and the recommendation resolver only see the
//! [`EmbeddingProvider`] trait, so the remote API can be swapped for a mock
//! in tests or wrapped with a cache in the request path.

use crate::{error::AppResult, models::Embedding};

pub mod cached;
pub mod openai;

pub use cached::CachedEmbeddingProvider;
pub use openai::OpenAiEmbeddingProvider;

/// Trait for text embedding providers
///
/// One call is one outbound request. Errors are returned as-is; callers
/// decide whether to record, fall back, or abort.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single non-empty text
    async fn embed(&self, text: &str) -> AppResult<Embedding>;
}
