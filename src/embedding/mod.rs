//! Opaque text-to-vector embedding client.
//!
//! The embedding function itself is an external service; this module only
//! defines the [`EmbeddingProvider`] seam and an HTTP implementation. Vectors
//! are L2-normalized of exactly [`EMBEDDING_DIM`] dimensions so cosine
//! similarity can be derived from vec0 L2 distances.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};

/// Number of dimensions in the embedding vectors.
pub const EMBEDDING_DIM: usize = 384;

/// Trait for embedding text into vectors.
///
/// Implementations must produce L2-normalized vectors of exactly
/// [`EMBEDDING_DIM`] dimensions.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text string into a vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Return the number of dimensions this provider produces.
    fn dimensions(&self) -> usize {
        EMBEDDING_DIM
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

/// Embedding provider backed by an HTTP embedding service.
pub struct HttpEmbeddingProvider {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl HttpEmbeddingProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Embedding(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&EmbedRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await
            .map_err(|e| Error::Embedding(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::Embedding(e.to_string()))?;

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(e.to_string()))?;

        if body.embedding.len() != EMBEDDING_DIM {
            return Err(Error::Embedding(format!(
                "service returned {} dimensions, expected {EMBEDDING_DIM}",
                body.embedding.len()
            )));
        }

        Ok(l2_normalize(body.embedding))
    }
}

/// Scale a vector to unit length. Zero vectors are returned unchanged.
pub fn l2_normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
    v
}
