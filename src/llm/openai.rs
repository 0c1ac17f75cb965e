//! OpenAI Responses API backend

use super::{http_client, LanguageModel};
use crate::config::AgentConfig;
use crate::error::OrchestrationError;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

pub struct OpenAiClient {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiClient {
    pub fn new(config: &AgentConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();

        Ok(Self {
            client: http_client(config.timeout)?,
            api_key,
            model: config.model.clone(),
            endpoint: format!("{}/v1/responses", config.base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    async fn invoke(&self, prompt: &str, temperature: f32) -> Result<String> {
        let request = ResponsesRequest {
            model: &self.model,
            input: prompt,
            temperature,
        };

        info!(model = %self.model, prompt_chars = prompt.len(), "Calling OpenAI Responses API");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                let err = OrchestrationError::from_request("openai", e);
                error!("OpenAI request failed: {}", err);
                err
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "OpenAI error response: {}", error_text);
            return Err(OrchestrationError::from_status("openai", status, &error_text));
        }

        let body: ResponsesResponse = response.json().await.map_err(|e| {
            error!("Failed to parse OpenAI response: {}", e);
            OrchestrationError::LlmError(format!("OpenAI parse error: {}", e))
        })?;

        body.output_text()
    }
}

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: &'a str,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ResponsesResponse {
    /// Convenience field some API versions return directly
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Debug, Deserialize)]
struct OutputContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl ResponsesResponse {
    fn output_text(self) -> Result<String> {
        if let Some(text) = self.output_text.filter(|t| !t.is_empty()) {
            return Ok(text);
        }

        let text: String = self
            .output
            .into_iter()
            .flat_map(|item| item.content)
            .filter(|c| c.kind == "output_text")
            .filter_map(|c| c.text)
            .collect();

        if text.is_empty() {
            return Err(OrchestrationError::LlmError(
                "OpenAI response contained no output text".to_string(),
            ));
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = ResponsesRequest {
            model: "gpt-4o-mini",
            input: "Generate a plan",
            temperature: 0.0,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["input"], "Generate a plan");
        assert_eq!(json["temperature"], 0.0);
    }

    #[test]
    fn test_output_text_from_message_items() {
        let raw = r#"{
            "id": "resp_1",
            "output": [
                {"type": "reasoning", "content": []},
                {"type": "message", "role": "assistant", "content": [
                    {"type": "output_text", "text": "Diversify", "annotations": []},
                    {"type": "output_text", "text": " gradually."}
                ]}
            ]
        }"#;
        let response: ResponsesResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.output_text().unwrap(), "Diversify gradually.");
    }

    #[test]
    fn test_convenience_field_preferred() {
        let raw = r#"{"output_text": "Hold bonds.", "output": []}"#;
        let response: ResponsesResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.output_text().unwrap(), "Hold bonds.");
    }

    #[test]
    fn test_refusal_only_is_an_error() {
        let raw = r#"{"output": [{"content": [{"type": "refusal", "refusal": "no"}]}]}"#;
        let response: ResponsesResponse = serde_json::from_str(raw).unwrap();
        assert!(response.output_text().is_err());
    }
}
