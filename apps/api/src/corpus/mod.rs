// Corpus ingestion: load raw documents from disk, split them into chunks.
// Runs once at startup. Nothing here touches the network.

pub mod chunker;
pub mod loader;

/// One logical source document: a whole plain-text file, or one PDF page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Path of the file the text came from.
    pub source: String,
    /// 1-based page number for paginated sources.
    pub page: Option<u32>,
    pub text: String,
}

/// A bounded slice of a single `Document`, the unit of retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentChunk {
    pub text: String,
    pub source: String,
    pub page: Option<u32>,
    /// Position within the parent document; restarts at 0 per document.
    pub index: usize,
}
