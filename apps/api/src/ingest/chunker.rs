//! Text chunking strategies applied before embedding.
//!
//! All sizes are measured in characters, never bytes, so multi-byte text is
//! never split inside a code point.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const FIXED_CHUNK_SIZE: usize = 1000;
pub const FIXED_CHUNK_OVERLAP: usize = 200;
pub const PARAGRAPH_MAX_CHARS: usize = 1500;

#[derive(Debug, Error, PartialEq)]
pub enum ChunkError {
    #[error("Invalid strategy. Use one of: fixed, simple, paragraph")]
    InvalidStrategy(String),

    #[error("chunk_size must be > 0 and overlap must be smaller than chunk_size")]
    InvalidWindow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStrategy {
    /// Character windows with overlap. `simple` is accepted as an alias.
    #[serde(alias = "simple")]
    Fixed,
    /// Paragraphs greedily packed up to a size limit.
    Paragraph,
}

impl ChunkStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkStrategy::Fixed => "fixed",
            ChunkStrategy::Paragraph => "paragraph",
        }
    }
}

impl fmt::Display for ChunkStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChunkStrategy {
    type Err = ChunkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fixed" | "simple" => Ok(ChunkStrategy::Fixed),
            "paragraph" => Ok(ChunkStrategy::Paragraph),
            other => Err(ChunkError::InvalidStrategy(other.to_string())),
        }
    }
}

/// Splits `text` with the given strategy using the default sizes.
pub fn chunk_text(text: &str, strategy: ChunkStrategy) -> Vec<String> {
    match strategy {
        // Constant window sizes are always valid.
        ChunkStrategy::Fixed => {
            fixed_chunk(text, FIXED_CHUNK_SIZE, FIXED_CHUNK_OVERLAP).unwrap_or_default()
        }
        ChunkStrategy::Paragraph => paragraph_chunk(text, PARAGRAPH_MAX_CHARS),
    }
}

/// Splits by characters into windows of `chunk_size`, each starting `overlap`
/// characters before the previous window ended. Windows are trimmed and
/// blank windows dropped.
pub fn fixed_chunk(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>, ChunkError> {
    if chunk_size == 0 || overlap >= chunk_size {
        return Err(ChunkError::InvalidWindow);
    }

    let chars: Vec<char> = text.chars().collect();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        let window: String = chars[start..end].iter().collect();
        let trimmed = window.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }
        if end == chars.len() {
            break;
        }
        start = end - overlap;
    }

    Ok(chunks)
}

/// Splits on blank lines and joins consecutive paragraphs with `\n\n` while
/// their combined length stays within `max_chunk_chars`. A paragraph longer
/// than the limit becomes a chunk of its own.
pub fn paragraph_chunk(text: &str, max_chunk_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut buffer: Vec<&str> = Vec::new();
    let mut buffer_len = 0;

    for para in split_paragraphs(text) {
        let len = para.chars().count();
        if buffer_len + len <= max_chunk_chars {
            buffer.push(para);
            buffer_len += len;
        } else {
            if !buffer.is_empty() {
                chunks.push(buffer.join("\n\n"));
            }
            buffer = vec![para];
            buffer_len = len;
        }
    }
    if !buffer.is_empty() {
        chunks.push(buffer.join("\n\n"));
    }

    chunks
}

/// Paragraphs are separated by two or more consecutive newlines
/// (a `\r` before a newline is ignored).
fn split_paragraphs(text: &str) -> Vec<&str> {
    let mut paras = Vec::new();
    let mut para_start = 0;
    let mut newline_run = 0;
    let mut run_start = 0;

    for (idx, ch) in text.char_indices() {
        match ch {
            '\n' => {
                if newline_run == 0 {
                    run_start = idx;
                }
                newline_run += 1;
            }
            '\r' if newline_run > 0 => {}
            _ => {
                if newline_run >= 2 {
                    paras.push(&text[para_start..run_start]);
                    para_start = idx;
                }
                newline_run = 0;
            }
        }
    }
    paras.push(&text[para_start..]);

    paras
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}
