use anyhow::Result;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use ragmix_core::traits::Generator;

use crate::transport::{build_client, post_json};

/// Local Ollama server, non-streaming `/api/generate`.
pub struct OllamaGenerator {
    client: Client,
    url: String,
    model: String,
    temperature: f32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: Options,
}

#[derive(Serialize)]
struct Options {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaGenerator {
    pub fn new(base_url: &str, model: &str, temperature: f32, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: build_client(None, timeout_secs)?,
            url: format!("{}/api/generate", base_url.trim_end_matches('/')),
            model: model.to_string(),
            temperature,
        })
    }
}

impl Generator for OllamaGenerator {
    fn name(&self) -> &str {
        "ollama"
    }

    fn generate(&self, prompt: &str) -> Result<String> {
        let body = GenerateRequest { model: &self.model, prompt, stream: false, options: Options { temperature: self.temperature } };
        debug!(url = %self.url, model = %self.model, prompt_len = prompt.len(), "ollama generate");
        let response: GenerateResponse = post_json(&self.client, &self.url, &body)?;
        Ok(response.response)
    }
}
