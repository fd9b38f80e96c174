//! In-memory dense index: segments paired with embeddings, searched by
//! exhaustive cosine similarity.

pub mod index;
pub mod similarity;

pub use index::DenseIndex;
pub use similarity::{cosine, l2_norm};
