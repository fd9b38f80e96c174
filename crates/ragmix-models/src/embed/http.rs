use anyhow::{bail, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use ragmix_core::traits::Embedder;

use super::normalize;
use crate::transport::{build_client, post_json};

/// Requests larger than this are split.
const MAX_BATCH: usize = 100;

#[derive(Debug, Clone)]
pub struct HttpEmbedderConfig {
    /// Full URL, e.g. `https://api.openai.com/v1/embeddings`.
    pub endpoint: String,
    pub model: String,
    /// Falls back to `OPENAI_API_KEY`.
    pub api_key: Option<String>,
    pub dim: usize,
    pub timeout_secs: u64,
}

/// Remote embeddings from any OpenAI-compatible `/v1/embeddings` server.
pub struct HttpEmbedder {
    client: Client,
    config: HttpEmbedderConfig,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
    encoding_format: &'static str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

impl HttpEmbedder {
    pub fn new(config: HttpEmbedderConfig) -> Result<Self> {
        let api_key = config.api_key.clone().or_else(|| std::env::var("OPENAI_API_KEY").ok());
        if api_key.is_none() && config.endpoint.contains("openai.com") {
            warn!(endpoint = %config.endpoint, "no API key configured");
        }
        let client = build_client(api_key.as_deref(), config.timeout_secs)?;
        info!(endpoint = %config.endpoint, model = %config.model, dim = config.dim, "http embedder");
        Ok(Self { client, config })
    }

    fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = EmbeddingRequest {
            model: &self.config.model,
            input: texts,
            // only the text-embedding-3 family accepts a dimension override
            dimensions: self.config.model.contains("text-embedding-3").then_some(self.config.dim),
            encoding_format: "float",
        };
        debug!(endpoint = %self.config.endpoint, n = texts.len(), "embedding request");
        let response: EmbeddingResponse = post_json(&self.client, &self.config.endpoint, &body)?;

        let mut data = response.data;
        if data.len() != texts.len() {
            bail!("requested {} embeddings, got {}", texts.len(), data.len());
        }
        data.sort_by_key(|d| d.index);
        data.into_iter()
            .map(|d| {
                let mut v = d.embedding;
                if v.len() != self.config.dim {
                    bail!("expected {}-dimensional embeddings, server returned {}", self.config.dim, v.len());
                }
                normalize(&mut v);
                Ok(v)
            })
            .collect()
    }
}

impl Embedder for HttpEmbedder {
    fn dim(&self) -> usize {
        self.config.dim
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(MAX_BATCH) {
            out.extend(self.request(chunk)?);
        }
        Ok(out)
    }
}
