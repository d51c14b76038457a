//! Embedding service — maps text to fixed-dimension vectors.
//!
//! `Embedder` is the seam: `GoogleEmbedder` talks to the Generative Language
//! API in production, tests substitute a deterministic stub.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const GOOGLE_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Embedding model used for both corpus chunks and queries.
pub const EMBEDDING_MODEL: &str = "models/embedding-001";
/// `batchEmbedContents` accepts at most 100 requests per call.
const GOOGLE_MAX_BATCH: usize = 100;

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Embedding service returned {got} vectors for {expected} inputs")]
    CountMismatch { expected: usize, got: usize },
}

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds a batch of at most `max_batch()` inputs, one vector per input, in order.
    async fn embed(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError>;

    fn max_batch(&self) -> usize;
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Debug, Serialize)]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: Content<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    error: GoogleErrorBody,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    message: String,
}

/// Client for the Google Generative Language embeddings endpoint.
#[derive(Clone)]
pub struct GoogleEmbedder {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl GoogleEmbedder {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, EmbedError> {
        Self::with_base_url(api_key, GOOGLE_API_BASE, timeout)
    }

    pub fn with_base_url(
        api_key: String,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, EmbedError> {
        let client = Client::builder().timeout(timeout).build()?;
        let endpoint = format!(
            "{}/{}:batchEmbedContents",
            base_url.trim_end_matches('/'),
            EMBEDDING_MODEL
        );
        Ok(Self {
            client,
            api_key,
            endpoint,
        })
    }
}

#[async_trait]
impl Embedder for GoogleEmbedder {
    async fn embed(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let body = BatchEmbedRequest {
            requests: inputs
                .iter()
                .map(|&text| EmbedContentRequest {
                    model: EMBEDDING_MODEL,
                    content: Content {
                        parts: vec![Part { text }],
                    },
                })
                .collect(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GoogleError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(EmbedError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: BatchEmbedResponse = response.json().await?;
        if parsed.embeddings.len() != inputs.len() {
            return Err(EmbedError::CountMismatch {
                expected: inputs.len(),
                got: parsed.embeddings.len(),
            });
        }

        debug!("Embedded {} input(s)", inputs.len());
        Ok(parsed.embeddings.into_iter().map(|e| e.values).collect())
    }

    fn max_batch(&self) -> usize {
        GOOGLE_MAX_BATCH
    }
}
