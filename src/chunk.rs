//! Paragraph-boundary text chunker.
//!
//! Splits note text into [`Chunk`]s that respect a configurable `max_chars`
//! limit. Splitting occurs on paragraph boundaries (`\n\n`) so a case note
//! is never cut mid-paragraph before it reaches the extraction model.
//!
//! # Algorithm
//!
//! 1. Split text on `\n\n` paragraph boundaries.
//! 2. Accumulate paragraphs into a buffer, re-joined with `\n\n`.
//! 3. When appending the next paragraph would push the buffer past
//!    `max_chars`, flush the buffer as a chunk and start a new buffer with
//!    that paragraph.
//! 4. A paragraph longer than `max_chars` is never split; it becomes its
//!    own oversized chunk.
//! 5. Blank paragraphs (runs of more than two newlines) never open a new
//!    chunk, so no chunk is empty.
//!
//! Joining the returned chunk texts with `\n\n` reproduces the input.

/// Default chunk size in characters.
pub const DEFAULT_MAX_CHARS: usize = 2000;

/// Separator between paragraphs, both for splitting and re-joining.
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// A bounded-length segment of a note, alive only during extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
}

/// Split text into chunks on paragraph boundaries, respecting `max_chars`.
///
/// Lengths are measured in characters, not bytes. Returns no chunks for
/// empty input; otherwise every chunk is non-empty and indices are
/// contiguous from 0.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<Chunk> {
    if text.is_empty() {
        return Vec::new();
    }

    let separator_len = PARAGRAPH_SEPARATOR.chars().count();
    let mut chunks = Vec::new();
    let mut buf = String::new();
    let mut buf_len = 0usize;
    let mut buf_has_paragraph = false;

    for para in text.split(PARAGRAPH_SEPARATOR) {
        let para_len = para.chars().count();

        if buf_has_paragraph {
            let would_be = buf_len + separator_len + para_len;
            // Blank paragraphs stay with the preceding text.
            if would_be > max_chars && !buf.is_empty() && !para.is_empty() {
                push_chunk(&mut chunks, std::mem::take(&mut buf));
                buf.push_str(para);
                buf_len = para_len;
                continue;
            }
            buf.push_str(PARAGRAPH_SEPARATOR);
            buf_len += separator_len;
        }

        buf.push_str(para);
        buf_len += para_len;
        buf_has_paragraph = true;
    }

    if !buf.is_empty() {
        push_chunk(&mut chunks, buf);
    }

    chunks
}

fn push_chunk(chunks: &mut Vec<Chunk>, text: String) {
    let index = chunks.len();
    chunks.push(Chunk { index, text });
}
