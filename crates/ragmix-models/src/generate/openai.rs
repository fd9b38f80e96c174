use anyhow::{anyhow, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use ragmix_core::traits::Generator;

use crate::transport::{build_client, post_json};

/// OpenAI-compatible `/v1/chat/completions`; the prompt is sent as a single
/// user message.
pub struct OpenAiGenerator {
    client: Client,
    endpoint: String,
    model: String,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 1],
    temperature: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiGenerator {
    pub fn new(endpoint: &str, model: &str, api_key: Option<String>, temperature: f32, timeout_secs: u64) -> Result<Self> {
        let api_key = api_key.or_else(|| std::env::var("OPENAI_API_KEY").ok());
        if api_key.is_none() {
            warn!(endpoint, "no API key configured");
        }
        Ok(Self {
            client: build_client(api_key.as_deref(), timeout_secs)?,
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            temperature,
        })
    }
}

impl Generator for OpenAiGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    fn generate(&self, prompt: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: [Message { role: "user", content: prompt }],
            temperature: self.temperature,
        };
        debug!(endpoint = %self.endpoint, model = %self.model, "chat completion");
        let response: ChatResponse = post_json(&self.client, &self.endpoint, &body)?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow!("chat completion returned no content"))
    }
}
