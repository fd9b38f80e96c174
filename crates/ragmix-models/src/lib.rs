//! Embedding and generation backends behind the `Embedder` / `Generator`
//! traits from `ragmix-core`, selected from configuration.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use ragmix_core::settings::{EmbeddingSettings, GenerationSettings};
use ragmix_core::traits::{Embedder, Generator};

pub mod device;
pub mod embed;
pub mod generate;
pub mod pool;
pub mod tokenize;
mod transport;

pub use device::select_device;
pub use embed::bge::BgeEmbedder;
pub use embed::hashing::HashingEmbedder;
pub use embed::http::{HttpEmbedder, HttpEmbedderConfig};
pub use generate::ollama::OllamaGenerator;
pub use generate::openai::OpenAiGenerator;
pub use pool::masked_mean_l2;

pub fn embedder_from_settings(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    let embedder: Arc<dyn Embedder> = match settings {
        EmbeddingSettings::Hashing { dim } => Arc::new(HashingEmbedder::new(*dim)?),
        EmbeddingSettings::Local { model_dir, max_len } => Arc::new(BgeEmbedder::load(model_dir, *max_len)?),
        EmbeddingSettings::Http { endpoint, model, api_key, dim, timeout_secs } => Arc::new(HttpEmbedder::new(HttpEmbedderConfig {
            endpoint: endpoint.clone(),
            model: model.clone(),
            api_key: api_key.clone(),
            dim: *dim,
            timeout_secs: *timeout_secs,
        })?),
    };
    info!(dim = embedder.dim(), "embedder ready");
    Ok(embedder)
}

/// `None` when generation is disabled; the engine answers without it.
pub fn generator_from_settings(settings: &GenerationSettings) -> Result<Option<Arc<dyn Generator>>> {
    let generator: Arc<dyn Generator> = match settings {
        GenerationSettings::Disabled => {
            info!("generation disabled");
            return Ok(None);
        }
        GenerationSettings::Ollama { base_url, model, temperature, timeout_secs } => {
            Arc::new(OllamaGenerator::new(base_url, model, *temperature, *timeout_secs)?)
        }
        GenerationSettings::OpenAi { endpoint, model, api_key, temperature, timeout_secs } => {
            Arc::new(OpenAiGenerator::new(endpoint, model, api_key.clone(), *temperature, *timeout_secs)?)
        }
    };
    info!(generator = generator.name(), "generator ready");
    Ok(Some(generator))
}
