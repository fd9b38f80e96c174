//! Typed settings tree extracted from [`crate::config::Config`].
//!
//! Every section has defaults, so an empty `config.toml` yields a working
//! offline engine (hashing embedder, Ollama generation on localhost).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub segmenter: SegmenterSettings,
    pub bm25: Bm25Settings,
    pub dense: DenseSettings,
    pub fusion: FusionSettings,
    pub retrieval: RetrievalSettings,
    pub embedding: EmbeddingSettings,
    pub generation: GenerationSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let s = &self.segmenter;
        if s.max_chunk_size == 0 {
            return Err(Error::InvalidConfig("segmenter.max_chunk_size must be > 0".into()));
        }
        if s.overlap_size >= s.max_chunk_size {
            return Err(Error::InvalidConfig(format!(
                "segmenter.overlap_size ({}) must be smaller than max_chunk_size ({})",
                s.overlap_size, s.max_chunk_size
            )));
        }
        if self.bm25.k1 < 0.0 || !(0.0..=1.0).contains(&self.bm25.b) {
            return Err(Error::InvalidConfig(format!("bm25 k1={} b={} out of range", self.bm25.k1, self.bm25.b)));
        }
        if !(-1.0..=1.0).contains(&self.dense.min_score) {
            return Err(Error::InvalidConfig(format!("dense.min_score {} outside [-1, 1]", self.dense.min_score)));
        }
        if self.fusion.rrf_k == 0 {
            return Err(Error::InvalidConfig("fusion.rrf_k must be > 0".into()));
        }
        let r = &self.retrieval;
        if r.answer_results == 0 || r.ingest_concurrency == 0 || r.embed_batch_size == 0 {
            return Err(Error::InvalidConfig(
                "retrieval.answer_results, embed_batch_size and ingest_concurrency must be > 0".into(),
            ));
        }
        match &self.embedding {
            EmbeddingSettings::Hashing { dim } | EmbeddingSettings::Http { dim, .. } if *dim == 0 => {
                Err(Error::InvalidConfig("embedding.dim must be > 0".into()))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterSettings {
    /// Maximum segment length in characters, overlap included.
    pub max_chunk_size: usize,
    pub overlap_size: usize,
}

impl Default for SegmenterSettings {
    fn default() -> Self {
        Self { max_chunk_size: 500, overlap_size: 50 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopWordsSetting {
    English,
    Portuguese,
    #[serde(rename = "none")]
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Settings {
    pub k1: f32,
    pub b: f32,
    pub stopwords: StopWordsSetting,
}

impl Default for Bm25Settings {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75, stopwords: StopWordsSetting::English }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenseSettings {
    pub min_score: f32,
}

impl Default for DenseSettings {
    fn default() -> Self {
        Self { min_score: 0.65 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionStrategyKind {
    Rrf,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionKeyKind {
    ContentHash,
    SegmentId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionSettings {
    pub strategy: FusionStrategyKind,
    pub rrf_k: u32,
    pub key: FusionKeyKind,
}

impl Default for FusionSettings {
    fn default() -> Self {
        Self { strategy: FusionStrategyKind::Rrf, rrf_k: 60, key: FusionKeyKind::ContentHash }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Passages handed to the generator by `answer`.
    pub answer_results: usize,
    pub bm25_weight: f32,
    pub embedding_weight: f32,
    /// Applies to each embedding call: one query, or one ingest batch.
    pub embed_timeout_ms: u64,
    /// Segments per embedding call during ingestion.
    pub embed_batch_size: usize,
    pub generate_timeout_ms: u64,
    pub ingest_concurrency: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            answer_results: 5,
            bm25_weight: 0.5,
            embedding_weight: 0.5,
            embed_timeout_ms: 10_000,
            embed_batch_size: 8,
            generate_timeout_ms: 60_000,
            ingest_concurrency: 4,
        }
    }
}

fn default_dim() -> usize {
    384
}

fn default_max_len() -> usize {
    256
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_embedding_endpoint() -> String {
    "https://api.openai.com/v1/embeddings".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum EmbeddingSettings {
    /// Deterministic feature hashing; needs no model files.
    Hashing {
        #[serde(default = "default_dim")]
        dim: usize,
    },
    /// BGE-M3 weights on local disk, run with candle.
    Local {
        model_dir: PathBuf,
        #[serde(default = "default_max_len")]
        max_len: usize,
    },
    /// OpenAI-compatible `/v1/embeddings` endpoint.
    Http {
        #[serde(default = "default_embedding_endpoint")]
        endpoint: String,
        #[serde(default = "default_embedding_model")]
        model: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        api_key: Option<String>,
        #[serde(default = "default_dim")]
        dim: usize,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self::Hashing { dim: default_dim() }
    }
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3".to_string()
}

fn default_openai_chat_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_openai_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_generate_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum GenerationSettings {
    Disabled,
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
        #[serde(default = "default_ollama_model")]
        model: String,
        #[serde(default)]
        temperature: f32,
        #[serde(default = "default_generate_timeout_secs")]
        timeout_secs: u64,
    },
    OpenAi {
        #[serde(default = "default_openai_chat_endpoint")]
        endpoint: String,
        #[serde(default = "default_openai_chat_model")]
        model: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        api_key: Option<String>,
        #[serde(default)]
        temperature: f32,
        #[serde(default = "default_generate_timeout_secs")]
        timeout_secs: u64,
    },
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self::Ollama {
            base_url: default_ollama_url(),
            model: default_ollama_model(),
            temperature: 0.0,
            timeout_secs: default_generate_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}
