//! Document chunking strategies.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`FixedSizeChunker`]: slides a fixed character window with configurable overlap
//! - [`RecursiveChunker`]: splits on paragraphs, lines, sentences, words, then characters
//!
//! Both measure sizes in characters, never cut a UTF-8 code point in half, and
//! produce chunks whose byte ranges together cover the whole document.

use std::collections::VecDeque;
use std::ops::Range;

use crate::document::{Chunk, Document};

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with text and metadata but no embeddings.
/// Embeddings are attached later by the index builder.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has empty text.
    /// Each returned chunk has an empty embedding vector.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Turn byte ranges over `document.text` into chunks.
///
/// Chunk IDs are generated as `{document_id}_{chunk_index}`. Each chunk inherits
/// the parent document's metadata plus a `chunk_index` field.
fn build_chunks(document: &Document, ranges: Vec<Range<usize>>) -> Vec<Chunk> {
    ranges
        .into_iter()
        .enumerate()
        .map(|(i, byte_range)| {
            let mut metadata = document.metadata.clone();
            metadata.insert("chunk_index".to_string(), i.to_string());
            Chunk {
                id: format!("{}_{i}", document.id),
                text: document.text[byte_range.clone()].to_string(),
                embedding: Vec::new(),
                metadata,
                document_id: document.id.clone(),
                byte_range,
            }
        })
        .collect()
}

/// Splits text into fixed-size windows by character count with configurable overlap.
///
/// The window advances by `chunk_size - chunk_overlap` characters and stops as
/// soon as it reaches the end of the text.
///
/// # Example
///
/// ```rust,ignore
/// use rag_agent::FixedSizeChunker;
///
/// let chunker = FixedSizeChunker::new(256, 50);
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk (at least 1)
    /// * `chunk_overlap`: number of overlapping characters between consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size: chunk_size.max(1), chunk_overlap }
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let text = &document.text;
        if text.is_empty() {
            return Vec::new();
        }

        // Byte offset of every character start, plus the end of the text.
        let boundaries: Vec<usize> =
            text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
        let char_count = boundaries.len() - 1;
        let step = self.chunk_size.saturating_sub(self.chunk_overlap).max(1);

        let mut ranges = Vec::new();
        let mut start = 0;
        loop {
            let end = (start + self.chunk_size).min(char_count);
            ranges.push(boundaries[start]..boundaries[end]);
            if end == char_count {
                break;
            }
            start += step;
        }

        build_chunks(document, ranges)
    }
}

/// Separators tried in order by [`RecursiveChunker`]. The empty separator
/// splits into individual characters.
const SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", " ", ""];

/// Splits text on natural boundaries, then merges the pieces back into chunks.
///
/// Text longer than `chunk_size` is split on the first separator it contains
/// (paragraph break, line break, sentence end, space, and finally individual
/// characters). Pieces still too long are split again with the remaining
/// separators. Consecutive pieces are then merged into chunks of at most
/// `chunk_size` characters, and the trailing pieces of each chunk (at most
/// `chunk_overlap` characters) are repeated at the start of the next one.
///
/// Separators stay attached to the piece they end, so no text is dropped.
///
/// # Example
///
/// ```rust,ignore
/// use rag_agent::RecursiveChunker;
///
/// let chunker = RecursiveChunker::new(500, 50);
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk (at least 1)
    /// * `chunk_overlap`: number of overlapping characters between consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size: chunk_size.max(1), chunk_overlap }
    }
}

/// A contiguous piece of the source text.
#[derive(Debug, Clone, Copy)]
struct Piece {
    start: usize,
    end: usize,
    chars: usize,
}

/// Split `text` (located at `offset` in the document) into pieces of at most
/// `chunk_size` characters.
fn split_recursive(
    text: &str,
    offset: usize,
    chunk_size: usize,
    separators: &[&str],
    pieces: &mut Vec<Piece>,
) {
    let chars = text.chars().count();
    if chars <= chunk_size {
        if chars > 0 {
            pieces.push(Piece { start: offset, end: offset + text.len(), chars });
        }
        return;
    }

    let (separator, remaining) =
        match separators.iter().position(|sep| sep.is_empty() || text.contains(sep)) {
            Some(i) => (separators[i], &separators[i + 1..]),
            None => ("", &[][..]),
        };

    if separator.is_empty() {
        for (i, c) in text.char_indices() {
            pieces.push(Piece { start: offset + i, end: offset + i + c.len_utf8(), chars: 1 });
        }
        return;
    }

    for (start, segment) in split_keeping_separator(text, separator) {
        split_recursive(segment, offset + start, chunk_size, remaining, pieces);
    }
}

/// Split text at a separator while keeping the separator attached to the
/// preceding segment. Returns each segment with its byte offset.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<(usize, &'a str)> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push((start, &text[start..end]));
        start = end;
    }

    if start < text.len() {
        result.push((start, &text[start..]));
    }

    result
}

/// Greedily merge consecutive pieces into chunk ranges, carrying up to
/// `chunk_overlap` characters of trailing pieces into the next chunk.
fn merge_pieces(pieces: &[Piece], chunk_size: usize, chunk_overlap: usize) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut window: VecDeque<Piece> = VecDeque::new();
    let mut window_chars = 0;

    for piece in pieces {
        if !window.is_empty() && window_chars + piece.chars > chunk_size {
            if let (Some(first), Some(last)) = (window.front(), window.back()) {
                ranges.push(first.start..last.end);
            }
            while window_chars > chunk_overlap
                || (window_chars > 0 && window_chars + piece.chars > chunk_size)
            {
                match window.pop_front() {
                    Some(dropped) => window_chars -= dropped.chars,
                    None => break,
                }
            }
        }
        window.push_back(*piece);
        window_chars += piece.chars;
    }

    if let (Some(first), Some(last)) = (window.front(), window.back()) {
        ranges.push(first.start..last.end);
    }

    ranges
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        if document.text.is_empty() {
            return Vec::new();
        }

        let mut pieces = Vec::new();
        split_recursive(&document.text, 0, self.chunk_size, &SEPARATORS, &mut pieces);
        let ranges = merge_pieces(&pieces, self.chunk_size, self.chunk_overlap);

        build_chunks(document, ranges)
    }
}
