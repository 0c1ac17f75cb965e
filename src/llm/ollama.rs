//! Local Ollama backend (`/api/generate`, non-streaming)

use super::{http_client, LanguageModel};
use crate::config::AgentConfig;
use crate::error::OrchestrationError;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

pub struct OllamaClient {
    client: Client,
    model: String,
    endpoint: String,
}

impl OllamaClient {
    pub fn new(config: &AgentConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config.timeout)?,
            model: config.model.clone(),
            endpoint: format!("{}/api/generate", config.base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl LanguageModel for OllamaClient {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn invoke(&self, prompt: &str, temperature: f32) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions { temperature },
        };

        info!(model = %self.model, prompt_chars = prompt.len(), "Calling Ollama");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                let err = OrchestrationError::from_request("ollama", e);
                error!("Ollama request failed: {}", err);
                err
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "Ollama error response: {}", error_text);
            return Err(OrchestrationError::from_status("ollama", status, &error_text));
        }

        let body: GenerateResponse = response.json().await.map_err(|e| {
            OrchestrationError::LlmError(format!("Ollama parse error: {}", e))
        })?;

        debug!(done = body.done, eval_count = ?body.eval_count, "Ollama generation finished");

        Ok(body.response)
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    done: bool,
    eval_count: Option<u64>,
}
