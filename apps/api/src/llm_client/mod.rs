/// LLM Client — the single point of entry for completion API calls.
///
/// ARCHITECTURAL RULE: No other module may call the completion provider directly.
/// Everything goes through `CompletionService`, which `AppState` carries as a
/// trait object so tests can substitute a stub.
///
/// Model: llama3-8b-8192 on Groq (hardcoded, no sampling parameters: provider defaults apply)
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
/// The model used for every assessment.
pub const MODEL: &str = "llama3-8b-8192";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Sends a prompt to a completion provider and returns the raw response object.
///
/// The response is returned undecoded; interpreting its shape is the job of
/// `assessment::extract`.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<Value, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

/// Groq chat-completions client (OpenAI-compatible wire format).
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl LlmClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, LlmError> {
        Self::with_endpoint(api_key, GROQ_API_URL, timeout)
    }

    pub fn with_endpoint(
        api_key: String,
        endpoint: &str,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl CompletionService for LlmClient {
    /// Single attempt. Transport failures and non-2xx statuses are returned as
    /// errors; callers decide how to surface them.
    async fn complete(&self, prompt: &str) -> Result<Value, LlmError> {
        let request_body = ChatRequest {
            model: MODEL,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Try to parse error message
            let message = serde_json::from_str::<ProviderError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let value: Value = serde_json::from_str(&body)?;

        debug!("Completion call succeeded: {} bytes", body.len());
        Ok(value)
    }
}
