use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

use ragmix_core::error::{Error, Result};
use ragmix_core::settings::Bm25Settings;
use ragmix_core::traits::TextIndexer;
use ragmix_core::types::{DocNo, ScoredSegment, Segment};

use crate::tokenize::{Analyzer, StopWords};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
	pub k1: f32,
	pub b: f32,
}

impl Default for Bm25Params {
	fn default() -> Self {
		Self { k1: 1.2, b: 0.75 }
	}
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Posting {
	pub(crate) doc: DocNo,
	pub(crate) tf: u32,
}

/// Everything a search reads. Mutated only under the write lock, and only
/// after tokenization is done, so readers never see half of a segment.
#[derive(Default)]
pub(crate) struct Postings {
	pub(crate) segments: Vec<Segment>,
	pub(crate) doc_lens: Vec<u32>,
	pub(crate) total_len: u64,
	/// term -> postings in ascending `DocNo` order
	pub(crate) terms: HashMap<String, Vec<Posting>>,
	/// exact-match metadata fields: (key, value) -> docs
	pub(crate) fields: HashMap<(String, String), Vec<DocNo>>,
}

/// BM25 inverted index with single-writer discipline.
pub struct SparseIndex {
	pub(crate) analyzer: Analyzer,
	pub(crate) params: Bm25Params,
	pub(crate) state: RwLock<Postings>,
}

impl SparseIndex {
	pub fn new(analyzer: Analyzer, params: Bm25Params) -> Self {
		Self { analyzer, params, state: RwLock::new(Postings::default()) }
	}

	pub fn from_settings(settings: &Bm25Settings) -> Self {
		let analyzer = Analyzer::new(&StopWords::from(settings.stopwords));
		Self::new(analyzer, Bm25Params { k1: settings.k1, b: settings.b })
	}

	/// Index `segment` under a fresh `DocNo`. Adding the same segment twice
	/// indexes it twice.
	pub fn add(&self, segment: &Segment) -> Result<DocNo> {
		let tokens = self.analyzer.tokenize(&segment.text);
		let doc_len = u32::try_from(tokens.len()).map_err(|_| Error::Operation("segment too long to index".into()))?;
		let mut tf: HashMap<String, u32> = HashMap::new();
		for token in tokens {
			*tf.entry(token).or_default() += 1;
		}

		let mut state = self.state.write();
		let doc = DocNo(u32::try_from(state.segments.len()).map_err(|_| Error::Operation("sparse index is full".into()))?);
		for (term, freq) in tf {
			state.terms.entry(term).or_default().push(Posting { doc, tf: freq });
		}
		for (key, value) in &segment.metadata {
			state.fields.entry((key.clone(), value.clone())).or_default().push(doc);
		}
		state.segments.push(segment.clone());
		state.doc_lens.push(doc_len);
		state.total_len += u64::from(doc_len);
		debug!(doc = doc.0, doc_len, "sparse add");
		Ok(doc)
	}

	pub fn len(&self) -> usize {
		self.state.read().segments.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Number of distinct indexed terms.
	pub fn term_count(&self) -> usize {
		self.state.read().terms.len()
	}

	/// Document frequency of `term` after it goes through the analyzer.
	pub fn doc_freq(&self, term: &str) -> usize {
		let Some(normalized) = self.analyzer.tokenize(term).into_iter().next() else { return 0 };
		self.state.read().terms.get(&normalized).map_or(0, Vec::len)
	}

	pub fn avg_doc_len(&self) -> f32 {
		let state = self.state.read();
		if state.segments.is_empty() { 0.0 } else { state.total_len as f32 / state.segments.len() as f32 }
	}

	pub fn clear(&self) {
		*self.state.write() = Postings::default();
	}
}

impl TextIndexer for SparseIndex {
	fn add(&self, segment: &Segment) -> Result<DocNo> { Self::add(self, segment) }
	fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredSegment>> { Self::search(self, query, k) }
	fn clear(&self) { Self::clear(self) }
}
