use crate::{
    cached,
    db::{Cache, CacheKey},
    error::AppResult,
    models::Embedding,
    services::embeddings::EmbeddingProvider,
};

/// Caches prompt embeddings in Redis in front of another provider
///
/// Used on the recommendation path only: repeated prompts cost one provider
/// call per TTL. The refresh job talks to the provider directly so stale
/// descriptions are always recomputed.
pub struct CachedEmbeddingProvider<P> {
    inner: P,
    cache: Cache,
    model: String,
    ttl: u64,
}

impl<P: EmbeddingProvider> CachedEmbeddingProvider<P> {
    pub fn new(inner: P, cache: Cache, model: impl Into<String>, ttl: u64) -> Self {
        Self {
            inner,
            cache,
            model: model.into(),
            ttl,
        }
    }
}

#[async_trait::async_trait]
impl<P: EmbeddingProvider> EmbeddingProvider for CachedEmbeddingProvider<P> {
    async fn embed(&self, text: &str) -> AppResult<Embedding> {
        cached!(
            self.cache,
            CacheKey::PromptEmbedding {
                model: self.model.clone(),
                prompt: text.to_string(),
            },
            self.ttl,
            self.inner.embed(text)
        )
    }
}
