//! Transport chunking: split an oversized document at section
//! boundaries without losing or duplicating content.
//!
//! Chunks are exact substrings of the input, so concatenating them
//! always reproduces the original document byte for byte. Cuts are
//! placed before markdown section headers where possible; a single
//! section larger than the limit is hard-sliced into fixed-size pieces
//! on character boundaries.

/// Default transport chunk limit in characters.
pub const DEFAULT_CHUNK_LIMIT: usize = 4096;

/// Split `text` into ordered chunks of at most `limit` characters.
///
/// An empty document yields no chunks; a document within the limit is
/// returned whole. A zero limit disables splitting and also returns
/// the document whole.
pub fn split_chunks(text: &str, limit: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    if limit == 0 || char_len(text) <= limit {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current_start = 0usize;
    let mut current_chars = 0usize;

    for (start, end) in section_ranges(text) {
        let segment = &text[start..end];
        let segment_chars = char_len(segment);

        if segment_chars > limit {
            // Oversized section: flush what we have, then hard-slice it.
            if current_chars > 0 {
                chunks.push(text[current_start..start].to_string());
            }
            hard_slice(segment, limit, &mut chunks);
            current_start = end;
            current_chars = 0;
        } else if current_chars + segment_chars > limit && current_chars > 0 {
            // Cut before this section header.
            chunks.push(text[current_start..start].to_string());
            current_start = start;
            current_chars = segment_chars;
        } else {
            if current_chars == 0 {
                current_start = start;
            }
            current_chars += segment_chars;
        }
    }

    if current_chars > 0 {
        chunks.push(text[current_start..].to_string());
    }

    chunks
}

/// Byte ranges of the document's sections. A new section starts at
/// every line beginning with a markdown header marker; text before the
/// first header is its own leading section.
fn section_ranges(text: &str) -> Vec<(usize, usize)> {
    let mut starts = vec![0usize];
    let mut offset = 0usize;

    for line in text.split_inclusive('\n') {
        if offset != 0 && line.starts_with('#') {
            starts.push(offset);
        }
        offset += line.len();
    }

    let mut ranges = Vec::with_capacity(starts.len());
    for (i, start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(text.len());
        if start < &end {
            ranges.push((*start, end));
        }
    }
    ranges
}

/// Slice one oversized segment into pieces of exactly `limit`
/// characters (the last piece may be shorter), respecting UTF-8
/// character boundaries.
fn hard_slice(segment: &str, limit: usize, out: &mut Vec<String>) {
    let mut piece_start = 0usize;
    let mut count = 0usize;

    for (idx, _) in segment.char_indices() {
        if count == limit {
            out.push(segment[piece_start..idx].to_string());
            piece_start = idx;
            count = 0;
        }
        count += 1;
    }
    if piece_start < segment.len() {
        out.push(segment[piece_start..].to_string());
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
