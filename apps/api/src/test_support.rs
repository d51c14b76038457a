//! Deterministic stand-ins for the external embedding and completion services.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::llm_client::{CompletionService, LlmError};
use crate::retrieval::embedder::{EmbedError, Embedder};
use crate::retrieval::index::IndexState;
use crate::state::AppState;

const VOCABULARY: [&str; 9] = [
    "mental",
    "health",
    "assessment",
    "stress",
    "sleep",
    "anxiety",
    "worry",
    "exercise",
    "gardening",
];

/// Bag-of-words embedder over a fixed vocabulary.
pub struct KeywordEmbedder {
    max_batch: usize,
    calls: AtomicUsize,
    fail_from_call: Option<usize>,
}

impl KeywordEmbedder {
    pub fn new(max_batch: usize) -> Self {
        Self {
            max_batch,
            calls: AtomicUsize::new(0),
            fail_from_call: None,
        }
    }

    /// Succeeds for the first `n` calls, then fails every call.
    pub fn failing_after(n: usize) -> Self {
        Self {
            fail_from_call: Some(n),
            ..Self::new(100)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vectorize(text: &str) -> Vec<f32> {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();
        VOCABULARY
            .iter()
            .map(|word| tokens.iter().filter(|t| *t == word).count() as f32)
            .collect()
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_from_call.is_some_and(|n| call >= n) {
            return Err(EmbedError::Api {
                status: 503,
                message: "embedding backend unavailable".to_string(),
            });
        }
        Ok(inputs.iter().map(|text| Self::vectorize(text)).collect())
    }

    fn max_batch(&self) -> usize {
        self.max_batch
    }
}

/// Embedder whose every call fails, as if the service were unreachable.
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _inputs: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Err(EmbedError::Api {
            status: 401,
            message: "API key not valid".to_string(),
        })
    }

    fn max_batch(&self) -> usize {
        100
    }
}

/// Completion service returning a canned response object.
pub struct StubCompletion {
    response: Value,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl StubCompletion {
    pub fn new(response: Value) -> Self {
        Self {
            response,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for StubCompletion {
    async fn complete(&self, prompt: &str) -> Result<Value, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        Ok(self.response.clone())
    }
}

/// Completion service that always fails with a provider error.
pub struct FailingCompletion {
    message: String,
}

impl FailingCompletion {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }

    fn error(&self) -> LlmError {
        LlmError::Api {
            status: 503,
            message: self.message.clone(),
        }
    }

    /// The exact text the failure renders as.
    pub fn error_message(&self) -> String {
        self.error().to_string()
    }
}

#[async_trait]
impl CompletionService for FailingCompletion {
    async fn complete(&self, _prompt: &str) -> Result<Value, LlmError> {
        Err(self.error())
    }
}

pub fn app_state(index: IndexState, llm: Arc<dyn CompletionService>) -> AppState {
    AppState {
        llm,
        index: Arc::new(index),
    }
}
