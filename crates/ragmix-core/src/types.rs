//! Domain types shared by the segmenter, both indices and the fusion engine.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub type Meta = HashMap<String, String>;

/// Stable segment identity stamped by the orchestrator before a segment is
/// handed to either index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId(pub u64);

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seg-{}", self.0)
    }
}

/// Posting-list document number inside one sparse index. Assigned in
/// insertion order, so comparing two `DocNo`s compares insertion time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocNo(pub u32);

/// Raw text plus string metadata, as supplied by a document source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    #[serde(default)]
    pub metadata: Meta,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), metadata: Meta::new() }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A chunk of a document: the atomic unit of indexing and retrieval.
///
/// - `id`: stable identity, `None` until the orchestrator assigns one
/// - `text`: an exact slice of the parent document
/// - `overlap_len`: byte length of the leading part of `text` that repeats
///   the tail of the previous segment (0 for the first segment)
/// - `metadata`: copied from the parent document, plus engine-added fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: Option<SegmentId>,
    pub text: String,
    pub metadata: Meta,
    #[serde(default)]
    pub overlap_len: usize,
}

impl Segment {
    pub fn new(text: impl Into<String>) -> Self {
        Self { id: None, text: text.into(), metadata: Meta::new(), overlap_len: 0 }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The part of `text` not shared with the previous segment.
    pub fn fresh_text(&self) -> &str {
        self.text.get(self.overlap_len..).unwrap_or("")
    }
}

/// Indicates which retrieval method produced a scored segment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SourceKind {
    Sparse,
    Dense,
}

/// One hit from a single index. `score` is index-specific (unbounded BM25 or
/// cosine in [-1, 1]) but higher is always better.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSegment {
    pub segment: Segment,
    pub score: f32,
    pub source: SourceKind,
}

/// A fused hit, produced at query time only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult {
    pub segment: Segment,
    pub score: f32,
}

impl RankedResult {
    pub fn text(&self) -> &str {
        &self.segment.text
    }

    pub fn metadata(&self) -> &Meta {
        &self.segment.metadata
    }
}
