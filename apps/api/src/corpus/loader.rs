//! Corpus Loader — reads the reference documents the assessment is grounded in.
//!
//! Policy:
//! 1. If `<root>/<corpus_file>` exists, load only that file (single-document mode).
//! 2. Otherwise walk `<root>` recursively and load every PDF, one `Document` per page.
//!    Unreadable directories are skipped.
//!
//! An unreadable PDF is skipped with a warning. If nothing readable remains the
//! load fails with `CorpusError::EmptyCorpus`.

use std::path::{Path, PathBuf};

use pdf_extract::extract_text_from_mem_by_pages;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::corpus::Document;

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("No readable documents found under {0}")]
    EmptyCorpus(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Loads the corpus rooted at `root`.
pub fn load_corpus(root: &Path, corpus_file: &str) -> Result<Vec<Document>, CorpusError> {
    let text_path = root.join(corpus_file);

    let documents = if text_path.is_file() {
        info!("Loading single-document corpus from {}", text_path.display());
        load_text_file(&text_path)?
    } else {
        info!(
            "{} not found, scanning {} for PDFs",
            text_path.display(),
            root.display()
        );
        collect_pdfs(root)
            .iter()
            .flat_map(|p| load_pdf(p))
            .collect()
    };

    if documents.is_empty() {
        return Err(CorpusError::EmptyCorpus(root.display().to_string()));
    }

    info!("Loaded {} document(s)", documents.len());
    Ok(documents)
}

fn load_text_file(path: &Path) -> Result<Vec<Document>, CorpusError> {
    let text = std::fs::read_to_string(path).map_err(|source| CorpusError::Io {
        path: path.display().to_string(),
        source,
    })?;

    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    Ok(vec![Document {
        source: path.display().to_string(),
        page: None,
        text,
    }])
}

/// Recursively collects `*.pdf` files in file-name order, skipping hidden entries.
/// Unreadable directories are logged and skipped.
fn collect_pdfs(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable corpus entry: {e}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_pdf(entry.path()))
        .map(DirEntry::into_path)
        .collect()
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

fn load_pdf(path: &Path) -> Vec<Document> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            warn!("Skipping {}: {e}", path.display());
            return Vec::new();
        }
    };

    let pages = match extract_text_from_mem_by_pages(&bytes) {
        Ok(pages) => pages,
        Err(e) => {
            warn!("Skipping {}: PDF extraction failed: {e}", path.display());
            return Vec::new();
        }
    };

    let source = path.display().to_string();
    let documents = number_pages(&source, pages);
    debug!("{source}: {} non-empty page(s)", documents.len());
    documents
}

/// One document per page, numbered from 1. Blank pages are dropped but keep
/// their number slot.
fn number_pages(source: &str, pages: Vec<String>) -> Vec<Document> {
    pages
        .into_iter()
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(i, text)| Document {
            source: source.to_string(),
            page: Some(i as u32 + 1),
            text,
        })
        .collect()
}
