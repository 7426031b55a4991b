//! OpenAI embeddings API provider
//!
//! Sends `POST {api_url}/embeddings` with a single input and returns the
//! first vector of the response. Every request is bounded by the client
//! timeout taken from configuration.

use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::Embedding,
    services::embeddings::EmbeddingProvider,
};

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: [&'a str; 1],
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Clone)]
pub struct OpenAiEmbeddingProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

impl OpenAiEmbeddingProvider {
    pub fn new(api_key: String, api_url: String, model: String, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    /// Builds the provider from configuration
    ///
    /// Fails with [`AppError::Config`] when the credential is missing.
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let api_key = config.embedding_credential()?;
        Self::new(
            api_key.to_string(),
            config.embedding_api_url.clone(),
            config.embedding_model.clone(),
            config.embedding_timeout(),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn first_embedding(response: EmbeddingResponse) -> AppResult<Embedding> {
        let embedding = response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| {
                AppError::ExternalApi("Embedding response contained no data".to_string())
            })?;

        if embedding.is_empty() {
            return Err(AppError::ExternalApi(
                "Embedding response contained an empty vector".to_string(),
            ));
        }

        Ok(embedding)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    async fn embed(&self, text: &str) -> AppResult<Embedding> {
        if text.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Cannot embed empty text".to_string(),
            ));
        }

        let url = format!("{}/embeddings", self.api_url);
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                input: [text],
                model: &self.model,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                model = %self.model,
                "Embedding request failed"
            );
            return Err(AppError::ExternalApi(format!(
                "Embedding API returned status {}: {}",
                status, body
            )));
        }

        let body: EmbeddingResponse = response.json().await?;
        let embedding = Self::first_embedding(body)?;

        tracing::debug!(
            model = %self.model,
            dimensions = embedding.len(),
            "Embedding computed"
        );

        Ok(embedding)
    }
}
