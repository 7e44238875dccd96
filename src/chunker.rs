//! Splits page text into synthesizable pieces.
//!
//! Sizes are counted in `char`s. Concatenating the chunks of a text, in
//! order and without separators, gives back the text exactly.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
}

pub fn split(text: &str, max_size: usize) -> Vec<Chunk> {
    let max_size = max_size.max(1);
    if text.is_empty() {
        return Vec::new();
    }

    // Byte offset of every char, plus the end of the text.
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let len = offsets.len() - 1;

    if len <= max_size {
        return vec![Chunk {
            index: 0,
            text: text.to_string(),
        }];
    }

    let mut chunks = Vec::with_capacity(len / max_size + 1);
    let mut cursor = 0usize;
    while cursor < len {
        let mut end = (cursor + max_size).min(len);
        if end < len {
            if let Some(ws) = last_whitespace(text, &offsets, cursor, end) {
                end = ws;
            }
        }
        chunks.push(Chunk {
            index: chunks.len(),
            text: text[offsets[cursor]..offsets[end]].to_string(),
        });
        cursor = end;
    }
    chunks
}

/// Char index of the last whitespace in `(cursor, end)`.
fn last_whitespace(text: &str, offsets: &[usize], cursor: usize, end: usize) -> Option<usize> {
    text[offsets[cursor + 1]..offsets[end]]
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map(|(byte, _)| {
            let abs = offsets[cursor + 1] + byte;
            // offsets is sorted, so the byte position maps back to its char index
            offsets.partition_point(|&o| o < abs)
        })
}

/// Reassembles chunks with `separator` between them.
pub fn join(chunks: &[Chunk], separator: &str) -> String {
    chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join(separator)
}
