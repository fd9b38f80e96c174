//! Hybrid retrieval: fuses lexical (BM25) and semantic (cosine) rankings and
//! coordinates ingestion, retrieval and answer generation.

pub mod engine;
pub mod fusion;
pub mod prompt;

pub use engine::{Answer, EngineBuilder, EngineStats, HybridSearchEngine, IngestFailure, IngestReport};
pub use fusion::{fusion_strategy, FusionKey, FusionStrategy, FusionWeights, LinearFusion, ReciprocalRankFusion};
