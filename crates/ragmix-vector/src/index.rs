use parking_lot::RwLock;
use std::cmp::Ordering;
use tracing::debug;

use ragmix_core::error::{Error, Result};
use ragmix_core::settings::DenseSettings;
use ragmix_core::traits::VectorIndexer;
use ragmix_core::types::{ScoredSegment, Segment, SourceKind};

use crate::similarity::{cosine_with_norms, l2_norm};

struct Entry {
	segment: Segment,
	vector: Vec<f32>,
	norm: f64,
}

#[derive(Default)]
struct Entries {
	/// fixed by the first successful add
	dim: Option<usize>,
	rows: Vec<Entry>,
}

/// Exhaustive cosine-similarity index. Every stored vector has the same
/// length; the first add decides it.
pub struct DenseIndex {
	min_score: f32,
	state: RwLock<Entries>,
}

impl Default for DenseIndex {
	fn default() -> Self {
		Self::from_settings(&DenseSettings::default())
	}
}

impl DenseIndex {
	pub fn new(min_score: f32) -> Self {
		Self { min_score, state: RwLock::new(Entries::default()) }
	}

	pub fn from_settings(settings: &DenseSettings) -> Self {
		Self::new(settings.min_score)
	}

	/// Default similarity threshold applied by [`VectorIndexer::search_vec`]
	/// callers that don't pick their own.
	pub fn min_score(&self) -> f32 {
		self.min_score
	}

	pub fn add(&self, segment: Segment, vector: Vec<f32>) -> Result<()> {
		if vector.is_empty() {
			return Err(Error::DimensionMismatch { expected: self.dimension().unwrap_or(0), actual: 0 });
		}
		let norm = l2_norm(&vector);
		let mut state = self.state.write();
		match state.dim {
			Some(dim) if dim != vector.len() => {
				return Err(Error::DimensionMismatch { expected: dim, actual: vector.len() });
			}
			Some(_) => {}
			None => state.dim = Some(vector.len()),
		}
		state.rows.push(Entry { segment, vector, norm });
		Ok(())
	}

	/// Up to `top_k` segments whose cosine similarity to `query` is at least
	/// `min_score`, best first; equal scores keep insertion order.
	pub fn search(&self, query: &[f32], top_k: usize, min_score: f32) -> Result<Vec<ScoredSegment>> {
		let state = self.state.read();
		let Some(dim) = state.dim else { return Ok(Vec::new()) };
		if query.len() != dim {
			return Err(Error::DimensionMismatch { expected: dim, actual: query.len() });
		}
		if top_k == 0 {
			return Ok(Vec::new());
		}
		let q_norm = l2_norm(query);
		let mut scored: Vec<(usize, f32)> = state
			.rows
			.iter()
			.enumerate()
			.map(|(i, e)| (i, cosine_with_norms(query, q_norm, &e.vector, e.norm)))
			.filter(|(_, s)| *s >= min_score)
			.collect();
		// stable sort keeps insertion order among equal scores
		scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
		scored.truncate(top_k);
		debug!(candidates = state.rows.len(), hits = scored.len(), min_score, "dense search");
		Ok(scored
			.into_iter()
			.map(|(i, score)| ScoredSegment { segment: state.rows[i].segment.clone(), score, source: SourceKind::Dense })
			.collect())
	}

	pub fn len(&self) -> usize {
		self.state.read().rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Vector length fixed by the first add, if any.
	pub fn dimension(&self) -> Option<usize> {
		self.state.read().dim
	}

	/// Drops all entries and forgets the dimension.
	pub fn clear(&self) {
		*self.state.write() = Entries::default();
	}
}

impl VectorIndexer for DenseIndex {
	fn add(&self, segment: Segment, vector: Vec<f32>) -> Result<()> { Self::add(self, segment, vector) }
	fn search_vec(&self, query: &[f32], k: usize, min_score: f32) -> Result<Vec<ScoredSegment>> { self.search(query, k, min_score) }
	fn clear(&self) { Self::clear(self) }
}
