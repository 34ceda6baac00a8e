//! Recursive character splitter.
//!
//! Text is cut on the first separator of the priority list that occurs in
//! it; pieces still longer than the window are cut again with the next
//! separators. Small pieces are then merged back into windows of at most
//! `chunk_size` characters, consecutive windows sharing up to
//! `chunk_overlap` characters. A separator stays attached to the start of
//! the piece that follows it. All lengths are counted in characters.

use std::collections::VecDeque;

use tracing::warn;

use crate::config::IngestConfig;

/// Separators tried in order: paragraph, line, sentence end, word, character.
pub const DEFAULT_SEPARATORS: [&str; 5] = ["\n\n", "\n", ".", " ", ""];

/// A window of text and where it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// The window, trimmed.
    pub text: String,
    /// Character offset of `text` in the split input.
    pub start_index: usize,
}

/// Splits text into overlapping windows that prefer semantic boundaries.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl TextSplitter {
    /// Create a splitter with the default separator list.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap: chunk_overlap.min(chunk_size.saturating_sub(1)),
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Create a splitter from ingestion settings.
    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Split into trimmed, non-empty windows.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    /// Split and locate each window in the input.
    pub fn split_with_offsets(&self, text: &str) -> Vec<TextChunk> {
        let mut chunks = Vec::new();
        let mut index: isize = 0;
        let mut previous_len: isize = 0;

        for piece in self.split_text(text) {
            let search_from = (index + previous_len - self.chunk_overlap as isize).max(0) as usize;
            let found = find_from_char(text, &piece, search_from)
                .or_else(|| find_from_char(text, &piece, 0))
                .unwrap_or(search_from);
            index = found as isize;
            previous_len = char_len(&piece) as isize;
            chunks.push(TextChunk {
                text: piece,
                start_index: found,
            });
        }
        chunks
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];
        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = "";
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.chunk_size {
                fitting.push(piece);
                continue;
            }
            if !fitting.is_empty() {
                chunks.extend(self.merge_pieces(&fitting));
                fitting.clear();
            }
            if remaining.is_empty() {
                chunks.push(piece.to_string());
            } else {
                chunks.extend(self.split_recursive(piece, remaining));
            }
        }
        if !fitting.is_empty() {
            chunks.extend(self.merge_pieces(&fitting));
        }
        chunks
    }

    fn merge_pieces(&self, pieces: &[&str]) -> Vec<String> {
        let mut windows = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);
            if total + len > self.chunk_size {
                if total > self.chunk_size {
                    warn!(
                        length = total,
                        chunk_size = self.chunk_size,
                        "Created a chunk longer than the configured size"
                    );
                }
                if !current.is_empty() {
                    if let Some(window) = join_trimmed(&current) {
                        windows.push(window);
                    }
                    while total > self.chunk_overlap
                        || (total + len > self.chunk_size && total > 0)
                    {
                        match current.pop_front() {
                            Some(front) => total -= char_len(front),
                            None => break,
                        }
                    }
                }
            }
            current.push_back(piece);
            total += len;
        }

        if let Some(window) = join_trimmed(&current) {
            windows.push(window);
        }
        windows
    }
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self::from_config(&IngestConfig::default())
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn join_trimmed(pieces: &VecDeque<&str>) -> Option<String> {
    let joined: String = pieces.iter().copied().collect();
    let trimmed = joined.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Split on `separator`, keeping it at the start of each following piece.
/// An empty separator splits into characters. Empty pieces are dropped.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut last = 0;
    for (idx, _) in text.match_indices(separator) {
        if idx > last {
            pieces.push(&text[last..idx]);
        }
        last = idx;
    }
    if last < text.len() {
        pieces.push(&text[last..]);
    }
    pieces
}

/// Character offset of `needle` in `haystack`, searching from character `from`.
fn find_from_char(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let byte_start = haystack
        .char_indices()
        .nth(from)
        .map(|(b, _)| b)
        .unwrap_or(haystack.len());
    haystack[byte_start..]
        .find(needle)
        .map(|rel| char_len(&haystack[..byte_start + rel]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_short_text_is_single_chunk() {
        let splitter = TextSplitter::new(100, 10);
        assert_eq!(splitter.split_text("  Hello world.  "), vec!["Hello world."]);
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        let splitter = TextSplitter::new(100, 10);
        assert!(splitter.split_text("").is_empty());
        assert!(splitter.split_text(" \n\n ").is_empty());
    }

    #[test]
    fn test_prefers_paragraph_boundaries() {
        let splitter = TextSplitter::new(30, 0);
        let text = "First paragraph here.\n\nSecond paragraph here.";
        assert_eq!(
            splitter.split_text(text),
            vec!["First paragraph here.", "Second paragraph here."]
        );
    }

    #[test]
    fn test_chunks_respect_size() {
        let splitter = TextSplitter::new(20, 5);
        let text = "lorem ipsum dolor sit amet consectetur adipiscing elit sed do eiusmod tempor";
        let chunks = splitter.split_text(text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 20, "chunk too long: {:?}", chunk);
        }
    }

    #[test]
    fn test_word_windows_overlap() {
        let splitter = TextSplitter::new(10, 4);
        let chunks = splitter.split_text("aaa bbb ccc ddd");
        assert_eq!(chunks, vec!["aaa bbb", "bbb ccc", "ccc ddd"]);
    }

    #[test]
    fn test_separator_kept_at_start_of_next_piece() {
        let pieces = split_keeping_separator("a.b.c", ".");
        assert_eq!(pieces, vec!["a", ".b", ".c"]);

        let pieces = split_keeping_separator(".a", ".");
        assert_eq!(pieces, vec![".a"]);
    }

    #[test]
    fn test_falls_back_to_characters() {
        let splitter = TextSplitter::new(4, 0);
        let chunks = splitter.split_text("abcdefghij");
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_offsets_locate_chunks() {
        let splitter = TextSplitter::new(10, 4);
        let text = "aaa bbb ccc ddd";
        let chunks = splitter.split_with_offsets(text);
        let starts: Vec<usize> = chunks.iter().map(|c| c.start_index).collect();
        assert_eq!(starts, vec![0, 4, 8]);
        for chunk in &chunks {
            let located: String = text.chars().skip(chunk.start_index).take(chunk.text.chars().count()).collect();
            assert_eq!(located, chunk.text);
        }
    }

    #[test]
    fn test_offsets_count_characters_not_bytes() {
        let splitter = TextSplitter::new(12, 0);
        let text = "élément été.\n\nsécurité données";
        let chunks = splitter.split_with_offsets(text);
        assert_eq!(chunks[0].start_index, 0);
        let second = &chunks[1];
        let located: String = text.chars().skip(second.start_index).take(second.text.chars().count()).collect();
        assert_eq!(located, second.text);
    }

    #[test]
    fn test_repeated_text_gets_increasing_offsets() {
        let splitter = TextSplitter::new(5, 0);
        let text = "same\nsame\nsame";
        let starts: Vec<usize> = splitter
            .split_with_offsets(text)
            .iter()
            .map(|c| c.start_index)
            .collect();
        assert_eq!(starts, vec![0, 5, 10]);
    }

    #[test]
    fn test_overlap_clamped_below_size() {
        let splitter = TextSplitter::new(5, 50);
        let chunks = splitter.split_text("one two three four five six");
        assert!(!chunks.is_empty());
    }
}
