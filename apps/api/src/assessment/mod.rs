// Assessment: the single-turn, document-grounded analysis behind POST /analyze.
// All completion calls go through llm_client; retrieval goes through retrieval::index.

pub mod extract;
pub mod handlers;
pub mod pipeline;
pub mod prompts;
