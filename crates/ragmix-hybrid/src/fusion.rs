use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hasher;
use twox_hash::XxHash64;

use ragmix_core::settings::{FusionKeyKind, FusionSettings, FusionStrategyKind};
use ragmix_core::types::{RankedResult, ScoredSegment, Segment, SegmentId};

/// Rank-smoothing constant for reciprocal rank fusion.
pub const DEFAULT_RRF_K: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    pub bm25: f32,
    pub embedding: f32,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self { bm25: 0.5, embedding: 0.5 }
    }
}

/// How a segment is recognized when it shows up in both lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FusionKey {
    /// xxHash64 of the text. Distinct segments with identical text merge.
    #[default]
    ContentHash,
    /// The orchestrator-assigned id; segments without one fall back to the
    /// content hash.
    SegmentId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Slot {
    Id(SegmentId),
    Content(u64),
}

pub fn content_hash(text: &str) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(text.as_bytes());
    hasher.finish()
}

impl FusionKey {
    fn slot(self, segment: &Segment) -> Slot {
        match (self, segment.id) {
            (FusionKey::SegmentId, Some(id)) => Slot::Id(id),
            _ => Slot::Content(content_hash(&segment.text)),
        }
    }
}

impl From<FusionKeyKind> for FusionKey {
    fn from(kind: FusionKeyKind) -> Self {
        match kind {
            FusionKeyKind::ContentHash => FusionKey::ContentHash,
            FusionKeyKind::SegmentId => FusionKey::SegmentId,
        }
    }
}

/// Merges a lexical and a semantic ranking into one list of at most
/// `max_results` entries, best first.
pub trait FusionStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn fuse(&self, sparse: &[ScoredSegment], dense: &[ScoredSegment], max_results: usize, weights: FusionWeights) -> Vec<RankedResult>;
}

/// Per-key accumulators in first-seen order. The first segment seen for a
/// key is the one returned.
struct Tally<S> {
    key: FusionKey,
    slots: HashMap<Slot, usize>,
    entries: Vec<(Segment, S)>,
}

impl<S: Default> Tally<S> {
    fn new(key: FusionKey) -> Self {
        Self { key, slots: HashMap::new(), entries: Vec::new() }
    }

    fn entry(&mut self, segment: &Segment) -> &mut S {
        let next = self.entries.len();
        let idx = *self.slots.entry(self.key.slot(segment)).or_insert(next);
        if idx == next {
            self.entries.push((segment.clone(), S::default()));
        }
        &mut self.entries[idx].1
    }

    /// Orders on the full-precision score and narrows to `f32` only for the
    /// returned results.
    fn rank(self, max_results: usize, score: impl Fn(&S) -> f64) -> Vec<RankedResult> {
        let mut ranked: Vec<(Segment, f64)> = self.entries.into_iter().map(|(segment, acc)| (segment, score(&acc))).collect();
        // stable: equal scores stay in first-seen order
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        ranked.truncate(max_results);
        ranked.into_iter().map(|(segment, score)| RankedResult { segment, score: score as f32 }).collect()
    }
}

/// `score(key) = Σ 1 / (rank + k)` over both lists, rank 0 being the best hit.
/// Only positions matter, so BM25 and cosine scores never need to be
/// normalized against each other. Weights are ignored.
#[derive(Debug, Clone, Copy)]
pub struct ReciprocalRankFusion {
    pub k: u32,
    pub key: FusionKey,
}

impl Default for ReciprocalRankFusion {
    fn default() -> Self {
        Self { k: DEFAULT_RRF_K, key: FusionKey::ContentHash }
    }
}

impl FusionStrategy for ReciprocalRankFusion {
    fn name(&self) -> &'static str {
        "rrf"
    }

    fn fuse(&self, sparse: &[ScoredSegment], dense: &[ScoredSegment], max_results: usize, _weights: FusionWeights) -> Vec<RankedResult> {
        let mut tally: Tally<f64> = Tally::new(self.key);
        for list in [sparse, dense] {
            for (rank, hit) in list.iter().enumerate() {
                *tally.entry(&hit.segment) += 1.0 / (rank as f64 + f64::from(self.k));
            }
        }
        tally.rank(max_results, |score| *score)
    }
}

#[derive(Default)]
struct Parts {
    lexical: Option<f32>,
    semantic: Option<f32>,
}

fn keep_max(slot: &mut Option<f32>, value: f32) {
    *slot = Some(slot.map_or(value, |v| v.max(value)));
}

/// Weighted sum of BM25 scores divided by the best BM25 score in the list and
/// raw cosine scores. A key seen several times in one list keeps its best
/// score from that list.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearFusion {
    pub key: FusionKey,
}

impl FusionStrategy for LinearFusion {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn fuse(&self, sparse: &[ScoredSegment], dense: &[ScoredSegment], max_results: usize, weights: FusionWeights) -> Vec<RankedResult> {
        let max_bm25 = sparse.iter().map(|h| h.score).fold(0.0f32, f32::max);
        let bm25_scale = if max_bm25 > 0.0 { 1.0 / max_bm25 } else { 1.0 };

        let mut tally: Tally<Parts> = Tally::new(self.key);
        for hit in sparse {
            keep_max(&mut tally.entry(&hit.segment).lexical, hit.score * bm25_scale * weights.bm25);
        }
        for hit in dense {
            keep_max(&mut tally.entry(&hit.segment).semantic, hit.score * weights.embedding);
        }
        tally.rank(max_results, |p| f64::from(p.lexical.unwrap_or(0.0)) + f64::from(p.semantic.unwrap_or(0.0)))
    }
}

pub fn fusion_strategy(settings: &FusionSettings) -> Box<dyn FusionStrategy> {
    let key = FusionKey::from(settings.key);
    match settings.strategy {
        FusionStrategyKind::Rrf => Box::new(ReciprocalRankFusion { k: settings.rrf_k, key }),
        FusionStrategyKind::Linear => Box::new(LinearFusion { key }),
    }
}
