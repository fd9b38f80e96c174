use crate::error::Result;
use crate::types::{DocNo, Document, ScoredSegment, Segment};

/// Text -> fixed-dimension vector. Must be deterministic for identical input
/// within one process.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedder returned no vector"))
    }
}

/// Prompt -> completion.
pub trait Generator: Send + Sync {
    fn name(&self) -> &str;
    fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

pub trait DocumentSource {
    fn documents(&self) -> anyhow::Result<Vec<Document>>;
}

pub trait TextIndexer: Send + Sync {
    fn add(&self, segment: &Segment) -> Result<DocNo>;
    fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredSegment>>;
    fn clear(&self);
}

pub trait VectorIndexer: Send + Sync {
    fn add(&self, segment: Segment, vector: Vec<f32>) -> Result<()>;
    fn search_vec(&self, query_vec: &[f32], k: usize, min_score: f32) -> Result<Vec<ScoredSegment>>;
    fn clear(&self);
}
