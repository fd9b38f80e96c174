use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use ragmix_core::error::Result;
use ragmix_core::types::{DocNo, ScoredSegment, SourceKind};

use crate::index::{Bm25Params, Postings, SparseIndex};

/// Metadata key carrying the lexical score on returned segments.
pub const BM25_SCORE_KEY: &str = "bm25_score";

/// `ln(1 + (N - df + 0.5) / (df + 0.5))`, never negative.
pub fn idf(n_docs: usize, doc_freq: usize) -> f32 {
	let n = n_docs as f32;
	let df = doc_freq as f32;
	(1.0 + (n - df + 0.5) / (df + 0.5)).ln()
}

/// Saturated, length-normalized term frequency.
pub fn term_weight(params: Bm25Params, tf: u32, doc_len: u32, avg_doc_len: f32) -> f32 {
	let tf = tf as f32;
	let norm = 1.0 - params.b + params.b * (doc_len as f32 / avg_doc_len);
	tf * (params.k1 + 1.0) / (tf + params.k1 * norm)
}

impl SparseIndex {
	/// Top `top_k` segments by BM25, best first; ties go to the earlier-added
	/// segment. Unknown or stopword-only queries return an empty list.
	pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<ScoredSegment>> {
		self.search_filtered(query, top_k, &[])
	}

	/// Like [`search`](Self::search), restricted to segments whose metadata
	/// matches every `(key, value)` pair exactly.
	pub fn search_filtered(&self, query: &str, top_k: usize, filters: &[(&str, &str)]) -> Result<Vec<ScoredSegment>> {
		let mut terms = self.analyzer.tokenize(query);
		terms.sort();
		terms.dedup();

		let state = self.state.read();
		if top_k == 0 || terms.is_empty() || state.segments.is_empty() {
			return Ok(Vec::new());
		}
		let allowed = allowed_docs(&state, filters);
		let n_docs = state.segments.len();
		let avg_doc_len = state.total_len as f32 / n_docs as f32;

		let mut scores: HashMap<DocNo, f32> = HashMap::new();
		for term in &terms {
			let Some(postings) = state.terms.get(term) else { continue };
			let idf = idf(n_docs, postings.len());
			for posting in postings {
				if allowed.as_ref().is_some_and(|set| !set.contains(&posting.doc)) {
					continue;
				}
				let doc_len = state.doc_lens[posting.doc.0 as usize];
				*scores.entry(posting.doc).or_default() += idf * term_weight(self.params, posting.tf, doc_len, avg_doc_len);
			}
		}

		let mut ranked: Vec<(DocNo, f32)> = scores.into_iter().collect();
		ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));
		ranked.truncate(top_k);

		let hits: Vec<ScoredSegment> = ranked
			.into_iter()
			.map(|(doc, score)| {
				let mut segment = state.segments[doc.0 as usize].clone();
				segment.metadata.insert(BM25_SCORE_KEY.to_string(), score.to_string());
				ScoredSegment { segment, score, source: SourceKind::Sparse }
			})
			.collect();
		debug!(query, terms = terms.len(), hits = hits.len(), "sparse search");
		Ok(hits)
	}
}

fn allowed_docs(state: &Postings, filters: &[(&str, &str)]) -> Option<HashSet<DocNo>> {
	let mut allowed: Option<HashSet<DocNo>> = None;
	for (key, value) in filters {
		let docs: HashSet<DocNo> = state
			.fields
			.get(&(key.to_string(), value.to_string()))
			.map(|d| d.iter().copied().collect())
			.unwrap_or_default();
		allowed = Some(match allowed {
			Some(prev) => prev.intersection(&docs).copied().collect(),
			None => docs,
		});
	}
	allowed
}
