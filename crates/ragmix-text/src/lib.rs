//! ragmix-text
//!
//! In-memory BM25 lexical index. Tokenization reuses Tantivy's analyzer
//! pipeline; postings, statistics and scoring live here.

pub mod index;
pub mod search;
pub mod tokenize;

pub use index::{Bm25Params, SparseIndex};
pub use tokenize::{Analyzer, StopWords};
