//! Model backends
//!
//! Every stage of the orchestrator talks to a model through the
//! [`LanguageModel`] trait: prompt text in, completion text out.
//! Hosted (OpenAI, Gemini) and local (Ollama) backends all satisfy it,
//! as does [`MockModel`] for tests and offline runs.

use crate::config::{AgentConfig, Backend};
use crate::error::OrchestrationError;
use crate::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::info;

pub mod gemini;
pub mod ollama;
pub mod openai;
pub mod retry;

pub use gemini::GeminiClient;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;
pub use retry::{RetryPolicy, RetryingModel};

/// Text-generation capability used by every orchestration stage
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &str;

    /// Send one prompt and return the completion text
    async fn invoke(&self, prompt: &str, temperature: f32) -> Result<String>;
}

/// Build the backend selected by `config`, wrapped in the configured retry policy.
pub fn build_model(config: &AgentConfig) -> Result<Arc<dyn LanguageModel>> {
    config.validate()?;

    let inner: Arc<dyn LanguageModel> = match config.backend {
        Backend::OpenAi => Arc::new(OpenAiClient::new(config)?),
        Backend::Ollama => Arc::new(OllamaClient::new(config)?),
        Backend::Gemini => Arc::new(GeminiClient::new(config)?),
        Backend::Mock => Arc::new(MockModel::offline()),
    };

    info!(
        backend = %config.backend,
        model = %config.model,
        max_retries = config.retry.max_retries,
        "Model backend ready"
    );

    Ok(Arc::new(RetryingModel::new(inner, config.retry.clone())))
}

/// Shared HTTP client setup for the hosted and local backends.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(8)
        .timeout(timeout)
        .build()
        .map_err(|e| OrchestrationError::ConfigError(format!("Failed to build HTTP client: {}", e)))
}

/// One prompt seen by a [`MockModel`]
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub prompt: String,
    pub temperature: f32,
}

type Responder = dyn Fn(&str) -> Result<String> + Send + Sync;

/// Mock model for development & testing.
/// Records every prompt it receives.
pub struct MockModel {
    responder: Box<Responder>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockModel {
    /// Answer every prompt with `responder`.
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&str) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Return the given responses in order, then fail.
    pub fn scripted<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let queue: Mutex<VecDeque<String>> =
            Mutex::new(responses.into_iter().map(Into::into).collect());

        Self::from_fn(move |_prompt| {
            queue
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front()
                .ok_or_else(|| OrchestrationError::LlmError("mock model has no scripted response left".to_string()))
        })
    }

    /// Canned, prompt-shaped answers so the CLI runs without any backend.
    pub fn offline() -> Self {
        Self::from_fn(|prompt| {
            let lowered = prompt.to_lowercase();
            let reply = if lowered.contains("numbered") && lowered.contains("plan") {
                "1. Review the facts provided\n2. Identify the main risks\n3. Weigh the options against the goal".to_string()
            } else if lowered.contains("fraud_risk_score") {
                r#"{"fraud_risk_score": 50, "risk_level": "Medium", "explanation": "Offline mock assessment."}"#.to_string()
            } else {
                let first_line = prompt
                    .lines()
                    .map(str::trim)
                    .find(|line| !line.is_empty())
                    .unwrap_or("");
                format!("[offline mock] {}", first_line)
            };
            Ok(reply)
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl LanguageModel for MockModel {
    fn name(&self) -> &str {
        "mock"
    }

    async fn invoke(&self, prompt: &str, temperature: f32) -> Result<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                prompt: prompt.to_string(),
                temperature,
            });

        (self.responder)(prompt)
    }
}
