//! Assessment pipeline.
//!
//! Flow: check index → retrieve top-k chunks → compose prompt →
//!       invoke completion service → extract text.
//!
//! Failure policy:
//! - index unavailable: hard failure (`AppError::IndexUnavailable`, HTTP 500),
//!   the completion service is never called;
//! - retrieval or generation failure: soft failure, returned as a result string
//!   prefixed with `ANALYSIS_ERROR_PREFIX` (HTTP 200).
//!
//! Single attempt per stage; nothing is retried.

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::assessment::extract::{extract_text, CompletionPayload};
use crate::assessment::prompts::compose;
use crate::corpus::DocumentChunk;
use crate::errors::AppError;
use crate::llm_client::{CompletionService, LlmError};
use crate::retrieval::index::{EmbeddingIndex, IndexError, IndexState};
use crate::retrieval::{RETRIEVAL_K, RETRIEVAL_QUERY};

pub const ANALYSIS_ERROR_PREFIX: &str = "Error during analysis:";

/// Failures that are reported to the client inside a 200 result.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Retrieval(#[from] IndexError),

    #[error(transparent)]
    Generation(#[from] LlmError),
}

/// Sends the composed prompt to the completion service and decodes the reply.
#[instrument(skip_all, fields(prompt_len = prompt.len(), context_chunks = retrieved_chunks.len()))]
pub async fn invoke(
    llm: &dyn CompletionService,
    prompt: &str,
    retrieved_chunks: &[DocumentChunk],
) -> Result<CompletionPayload, LlmError> {
    for chunk in retrieved_chunks {
        debug!(source = %chunk.source, page = ?chunk.page, index = chunk.index, "context chunk");
    }

    let raw = llm.complete(prompt).await?;
    Ok(CompletionPayload::decode(raw))
}

/// Runs one assessment end to end and returns the text for the `result` field.
pub async fn run_analysis(
    index: &IndexState,
    llm: &dyn CompletionService,
    user_responses: &str,
    question_origins: &str,
) -> Result<String, AppError> {
    let index = match index {
        IndexState::Ready(index) => index,
        IndexState::Unbuilt | IndexState::Failed(_) => return Err(AppError::IndexUnavailable),
    };

    match generate(index, llm, user_responses, question_origins).await {
        Ok(text) => Ok(text),
        Err(e) => {
            warn!("Assessment failed softly: {e}");
            Ok(format!("{ANALYSIS_ERROR_PREFIX} {e}"))
        }
    }
}

async fn generate(
    index: &EmbeddingIndex,
    llm: &dyn CompletionService,
    user_responses: &str,
    question_origins: &str,
) -> Result<String, AnalysisError> {
    let chunks = index.lookup(RETRIEVAL_QUERY, RETRIEVAL_K).await?;
    debug!("Retrieved {} context chunk(s)", chunks.len());

    let prompt = compose(user_responses, question_origins, &chunks);
    let payload = invoke(llm, &prompt, &chunks).await?;

    let text = extract_text(payload);
    info!("Assessment generated ({} chars)", text.len());
    Ok(text)
}
