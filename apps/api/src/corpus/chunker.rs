//! Recursive character splitter.
//!
//! Text is split on the coarsest separator it contains (paragraph, line, word,
//! then individual characters). Small pieces are merged back into windows of at
//! most `chunk_size` characters; each new window starts with up to
//! `chunk_overlap` characters carried over from the previous one.
//!
//! Lengths are counted in `char`s, never bytes, so multi-byte text is never cut
//! mid-character. Output is a pure function of the input.

use std::collections::VecDeque;

use thiserror::Error;

use crate::corpus::{Document, DocumentChunk};

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Coarsest first. The empty separator always matches and splits into chars.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkerError {
    #[error("chunk_size must be greater than zero")]
    ZeroChunkSize,

    #[error("chunk_overlap ({overlap}) is larger than chunk_size ({size})")]
    OverlapTooLarge { size: usize, overlap: usize },
}

#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl Chunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ChunkerError> {
        if chunk_size == 0 {
            return Err(ChunkerError::ZeroChunkSize);
        }
        if chunk_overlap > chunk_size {
            return Err(ChunkerError::OverlapTooLarge {
                size: chunk_size,
                overlap: chunk_overlap,
            });
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Chunks every document independently, preserving document order.
    pub fn split_documents(&self, documents: &[Document]) -> Vec<DocumentChunk> {
        documents
            .iter()
            .flat_map(|doc| {
                self.split_text(&doc.text)
                    .into_iter()
                    .enumerate()
                    .map(move |(index, text)| DocumentChunk {
                        text,
                        source: doc.source.clone(),
                        page: doc.page,
                        index,
                    })
            })
            .collect()
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &SEPARATORS)
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let position = separators
            .iter()
            .position(|sep| sep.is_empty() || text.contains(sep))
            .unwrap_or(separators.len().saturating_sub(1));
        let separator = separators.get(position).copied().unwrap_or("");
        let finer = separators.get(position + 1..).unwrap_or(&[]);

        let mut chunks = Vec::new();
        let mut pending: Vec<&str> = Vec::new();

        for piece in split_on(text, separator) {
            if char_len(piece) < self.chunk_size {
                pending.push(piece);
                continue;
            }

            if !pending.is_empty() {
                chunks.extend(self.merge(&pending, separator));
                pending.clear();
            }

            if finer.is_empty() {
                push_trimmed(&mut chunks, piece);
            } else {
                chunks.extend(self.split_recursive(piece, finer));
            }
        }

        if !pending.is_empty() {
            chunks.extend(self.merge(&pending, separator));
        }

        chunks
    }

    /// Greedily packs pieces into windows of at most `chunk_size` chars.
    fn merge(&self, pieces: &[&str], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut out = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);
            let joiner = |window: &VecDeque<&str>| if window.is_empty() { 0 } else { sep_len };

            if total + len + joiner(&window) > self.chunk_size && !window.is_empty() {
                push_trimmed(&mut out, &join(&window, separator));

                // Keep at most `chunk_overlap` chars as the head of the next window.
                while total > self.chunk_overlap
                    || (total > 0 && total + len + joiner(&window) > self.chunk_size)
                {
                    let Some(first) = window.pop_front() else {
                        break;
                    };
                    let dropped = char_len(first) + joiner(&window);
                    total = total.saturating_sub(dropped);
                }
            }

            window.push_back(piece);
            total += len + if window.len() > 1 { sep_len } else { 0 };
        }

        if !window.is_empty() {
            push_trimmed(&mut out, &join(&window, separator));
        }

        out
    }
}

fn split_on<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        text.char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect()
    } else {
        text.split(separator).filter(|s| !s.is_empty()).collect()
    }
}

fn join(window: &VecDeque<&str>, separator: &str) -> String {
    window.iter().copied().collect::<Vec<_>>().join(separator)
}

fn push_trimmed(out: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_words(n: usize) -> String {
        (0..n)
            .map(|i| format!("w{i:03}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn doc(source: &str, text: &str) -> Document {
        Document {
            source: source.to_string(),
            page: None,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_rejects_overlap_larger_than_size() {
        assert_eq!(
            Chunker::new(100, 101).unwrap_err(),
            ChunkerError::OverlapTooLarge {
                size: 100,
                overlap: 101
            }
        );
        assert_eq!(Chunker::new(0, 0).unwrap_err(), ChunkerError::ZeroChunkSize);
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunks =
            Chunker::default().split_text("  Breathing exercises help.\n\nSo does sleep. ");
        assert_eq!(
            chunks,
            vec!["Breathing exercises help.\n\nSo does sleep.".to_string()]
        );
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        assert!(Chunker::default().split_text("").is_empty());
        assert!(Chunker::default().split_text(" \n\n ").is_empty());
    }

    #[test]
    fn test_paragraphs_split_before_words() {
        let chunker = Chunker::new(10, 0).unwrap();
        let chunks = chunker.split_text("aaaa bbbb\n\ncccc dddd");
        assert_eq!(chunks, vec!["aaaa bbbb", "cccc dddd"]);
    }

    #[test]
    fn test_falls_back_to_characters_with_overlap() {
        let chunker = Chunker::new(5, 2).unwrap();
        let chunks = chunker.split_text("abcdefghij");
        assert_eq!(chunks, vec!["abcde", "defgh", "ghij"]);
    }

    #[test]
    fn test_default_chunks_respect_size_and_overlap() {
        let text = numbered_words(600);
        let chunks = Chunker::default().split_text(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= DEFAULT_CHUNK_SIZE);
        }

        // 4-char words + 1 space: 40 words is the largest tail within 200 chars.
        for pair in chunks.windows(2) {
            let tail: Vec<&str> = pair[0].split(' ').rev().take(40).collect();
            let tail: Vec<&str> = tail.into_iter().rev().collect();
            let head: Vec<&str> = pair[1].split(' ').take(40).collect();
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let docs = vec![
            doc("a.txt", &numbered_words(450)),
            doc("b.txt", &numbered_words(90)),
        ];
        let chunker = Chunker::default();
        let first = chunker.split_documents(&docs);
        let second = chunker.split_documents(&docs);
        assert_eq!(first, second);
    }

    #[test]
    fn test_chunks_never_span_documents() {
        let docs = vec![doc("a.txt", "alpha alpha"), doc("b.txt", "beta beta")];
        let chunks = Chunker::default().split_documents(&docs);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "alpha alpha");
        assert_eq!(chunks[0].source, "a.txt");
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[1].text, "beta beta");
        assert_eq!(chunks[1].source, "b.txt");
        assert_eq!(chunks[1].index, 0);
    }

    #[test]
    fn test_multibyte_text_is_counted_in_chars() {
        let chunker = Chunker::new(3, 0).unwrap();
        let chunks = chunker.split_text("ééééé");
        assert_eq!(chunks, vec!["ééé", "éé"]);
    }
}
