//! Paragraph-first document segmentation with overlapping boundaries.
//!
//! Segments are exact slices of the source text. A paragraph that does not
//! fit in one segment is cut at the last sentence end inside the budget,
//! else at the last whitespace, else hard at the character budget.
//! Consecutive segments share up to `overlap_size` characters, snapped
//! forward so the overlap never starts mid-word.

use crate::error::{Error, Result};
use crate::settings::SegmenterSettings;
use crate::types::{Document, Meta, Segment};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segmenter {
    max_chunk_size: usize,
    overlap_size: usize,
}

impl Segmenter {
    pub fn new(max_chunk_size: usize, overlap_size: usize) -> Result<Self> {
        if max_chunk_size == 0 {
            return Err(Error::InvalidConfig("max_chunk_size must be > 0".into()));
        }
        if overlap_size >= max_chunk_size {
            return Err(Error::InvalidConfig(format!(
                "overlap_size ({overlap_size}) must be smaller than max_chunk_size ({max_chunk_size})"
            )));
        }
        Ok(Self { max_chunk_size, overlap_size })
    }

    pub fn from_settings(settings: &SegmenterSettings) -> Result<Self> {
        Self::new(settings.max_chunk_size, settings.overlap_size)
    }

    pub fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    pub fn overlap_size(&self) -> usize {
        self.overlap_size
    }

    /// Lazily split `document`. The iterator is `Clone`, so cloning it (or
    /// calling `segment` again) restarts from the first segment.
    pub fn segment<'a>(&self, document: &'a Document) -> Segments<'a> {
        let text = document.text.as_str();
        let cursor = if document.is_blank() { text.len() } else { 0 };
        Segments {
            text,
            metadata: &document.metadata,
            max: self.max_chunk_size,
            overlap: self.overlap_size,
            start: cursor,
            cursor,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Segments<'a> {
    text: &'a str,
    metadata: &'a Meta,
    max: usize,
    overlap: usize,
    /// Byte offset where the next segment begins (overlap included).
    start: usize,
    /// Byte offset where the next segment's fresh content begins.
    cursor: usize,
}

impl Iterator for Segments<'_> {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        if self.cursor >= self.text.len() {
            return None;
        }
        let start = self.start;
        let used = char_len(&self.text[start..self.cursor]);
        let end = self.fill(self.cursor, self.max - used);
        let segment = Segment {
            id: None,
            text: self.text[start..end].to_string(),
            metadata: self.metadata.clone(),
            overlap_len: self.cursor - start,
        };
        self.start = self.overlap_begin(start, end);
        self.cursor = end;
        Some(segment)
    }
}

impl std::iter::FusedIterator for Segments<'_> {}

impl Segments<'_> {
    /// Pack whole paragraphs starting at `from` into `capacity` characters.
    /// Falls back to a sub-paragraph cut only when the first paragraph alone
    /// is too large.
    fn fill(&self, from: usize, capacity: usize) -> usize {
        let mut end = from;
        let mut remaining = capacity;
        while end < self.text.len() && remaining > 0 {
            let para_end = paragraph_end(self.text, end);
            let para_chars = char_len(&self.text[end..para_end]);
            if para_chars <= remaining {
                end = para_end;
                remaining -= para_chars;
                continue;
            }
            if end > from {
                break;
            }
            return split_within(self.text, end, remaining);
        }
        end
    }

    fn overlap_begin(&self, segment_start: usize, end: usize) -> usize {
        if self.overlap == 0 || end >= self.text.len() {
            return end;
        }
        let p = retreat_chars(self.text, end, self.overlap).max(segment_start);
        let at_word_start = self.text[..p].chars().next_back().map_or(true, char::is_whitespace);
        if at_word_start {
            return p;
        }
        match self.text[p..end].char_indices().find(|(_, c)| c.is_whitespace()) {
            Some((i, c)) => p + i + c.len_utf8(),
            None => end,
        }
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte offset just past the blank-line separator that ends the paragraph
/// starting at `from`, or the end of text.
fn paragraph_end(text: &str, from: usize) -> usize {
    let bytes = text.as_bytes();
    let mut i = from;
    while let Some(off) = text[i..].find('\n') {
        let nl = i + off;
        let mut j = nl + 1;
        while j < bytes.len() && matches!(bytes[j], b' ' | b'\t' | b'\r') {
            j += 1;
        }
        if j < bytes.len() && bytes[j] == b'\n' {
            let mut k = j + 1;
            while k < bytes.len() && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            return k;
        }
        i = nl + 1;
    }
    text.len()
}

/// Cut inside an oversized paragraph, at most `limit` characters past `start`.
fn split_within(text: &str, start: usize, limit: usize) -> usize {
    let window_end = advance_chars(text, start, limit);
    let window = &text[start..window_end];

    let mut sentence_cut = None;
    let mut space_cut = None;
    let mut after_terminal = false;
    for (i, c) in window.char_indices() {
        if c.is_whitespace() {
            let cut = start + i + c.len_utf8();
            if after_terminal {
                sentence_cut = Some(cut);
            }
            space_cut = Some(cut);
        } else {
            after_terminal = matches!(c, '.' | '!' | '?');
        }
    }
    sentence_cut.or(space_cut).unwrap_or(window_end)
}

fn advance_chars(text: &str, start: usize, n: usize) -> usize {
    text[start..].char_indices().nth(n).map_or(text.len(), |(i, _)| start + i)
}

fn retreat_chars(text: &str, end: usize, n: usize) -> usize {
    if n == 0 {
        return end;
    }
    text[..end].char_indices().rev().nth(n - 1).map_or(0, |(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraph_end_consumes_separator_run() {
        let text = "one\n\n\ntwo";
        assert_eq!(paragraph_end(text, 0), 6);
        assert_eq!(&text[6..], "two");
        assert_eq!(paragraph_end(text, 6), text.len());
    }

    #[test]
    fn paragraph_end_accepts_crlf_blank_lines() {
        let text = "one\r\n\r\ntwo";
        assert_eq!(&text[paragraph_end(text, 0)..], "two");
    }

    #[test]
    fn split_prefers_sentence_over_whitespace() {
        let text = "First one. Second sentence runs long";
        let cut = split_within(text, 0, 20);
        assert_eq!(&text[..cut], "First one. ");
    }

    #[test]
    fn split_falls_back_to_whitespace_then_hard_cut() {
        let text = "alpha beta gamma";
        assert_eq!(&text[..split_within(text, 0, 8)], "alpha ");
        let word = "abcdefghij";
        assert_eq!(&word[..split_within(word, 0, 4)], "abcd");
    }

    #[test]
    fn char_helpers_respect_multibyte_boundaries() {
        let text = "çãé ok";
        let p = advance_chars(text, 0, 2);
        assert_eq!(&text[..p], "çã");
        assert_eq!(&text[retreat_chars(text, text.len(), 3)..], " ok");
    }
}
