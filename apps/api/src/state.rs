use std::sync::Arc;

use crate::llm_client::CompletionService;
use crate::retrieval::index::IndexState;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Built once in `main` before the listener binds. Nothing in here is mutated
/// afterwards, so handlers read it without locks.
#[derive(Clone)]
pub struct AppState {
    /// Completion provider. `LlmClient` in production.
    pub llm: Arc<dyn CompletionService>,
    /// Corpus index, or the reason it could not be built.
    pub index: Arc<IndexState>,
}
