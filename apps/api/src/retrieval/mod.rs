// Retrieval: embeddings plus nearest-neighbour lookup over corpus chunks.

pub mod embedder;
pub mod index;

/// Number of chunks retrieved per assessment.
pub const RETRIEVAL_K: usize = 3;

/// Every assessment retrieves against the same query; the user's answers are
/// only seen by the language model.
pub const RETRIEVAL_QUERY: &str = "mental health assessment";
