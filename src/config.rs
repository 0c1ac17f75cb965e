//! Runtime configuration
//!
//! Everything the orchestrator needs to reach a model backend lives in one
//! explicit [`AgentConfig`] value. The binary builds it once from `.env` and
//! the process environment, applies CLI overrides, and passes it down.

use crate::error::OrchestrationError;
use crate::llm::retry::RetryPolicy;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    OpenAi,
    Ollama,
    Gemini,
    Mock,
}

impl Backend {
    pub fn default_model(&self) -> &'static str {
        match self {
            Backend::OpenAi => "gpt-4o-mini",
            Backend::Ollama => "gemma3:1b",
            Backend::Gemini => "gemini-2.0-flash",
            Backend::Mock => "mock",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Backend::OpenAi => DEFAULT_OPENAI_BASE_URL,
            Backend::Ollama => DEFAULT_OLLAMA_HOST,
            Backend::Gemini => DEFAULT_GEMINI_BASE_URL,
            Backend::Mock => "",
        }
    }

    /// Environment variable holding the credential, if the backend needs one.
    pub fn api_key_var(&self) -> Option<&'static str> {
        match self {
            Backend::OpenAi => Some("OPENAI_API_KEY"),
            Backend::Gemini => Some("GEMINI_API_KEY"),
            Backend::Ollama | Backend::Mock => None,
        }
    }
}

impl FromStr for Backend {
    type Err = OrchestrationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" | "gpt" => Ok(Backend::OpenAi),
            "ollama" | "local" => Ok(Backend::Ollama),
            "gemini" => Ok(Backend::Gemini),
            "mock" => Ok(Backend::Mock),
            other => Err(OrchestrationError::ConfigError(format!(
                "Unknown backend '{}' (expected openai, ollama, gemini or mock)",
                other
            ))),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Backend::OpenAi => "openai",
            Backend::Ollama => "ollama",
            Backend::Gemini => "gemini",
            Backend::Mock => "mock",
        };
        write!(f, "{}", s)
    }
}

/// Backend selection, model identifier, credential and run policy.
#[derive(Clone)]
pub struct AgentConfig {
    pub backend: Backend,
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: String,
    pub temperature: f32,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    /// Maximum number of step-reasoning calls in flight. 1 keeps the steps strictly sequential.
    pub step_concurrency: usize,
    /// Treat a plan with no numbered lines as an error instead of summarizing an empty log.
    pub reject_empty_plan: bool,
}

impl AgentConfig {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            model: backend.default_model().to_string(),
            api_key: None,
            base_url: backend.default_base_url().to_string(),
            temperature: 0.0,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
            step_concurrency: 1,
            reject_empty_plan: false,
        }
    }

    /// Load from the process environment (call `dotenv::dotenv()` first to pick up `.env`).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Unset or blank keys fall back to defaults.
    ///
    /// Values are parsed but not range-checked, so overrides can still be
    /// applied. Call [`AgentConfig::validate`] once they are in place;
    /// [`crate::llm::build_model`] validates as well.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend = match get("REASONER_BACKEND") {
            Some(value) => value.parse()?,
            None => Backend::OpenAi,
        };

        let mut config = Self::new(backend);

        if let Some(model) = get("REASONER_MODEL") {
            config.model = model;
        }

        if let Some(var) = backend.api_key_var() {
            config.api_key = get(var);
        }

        let base_url = match backend {
            Backend::Ollama => get("REASONER_BASE_URL").or_else(|| get("OLLAMA_HOST")),
            _ => get("REASONER_BASE_URL"),
        };
        if let Some(url) = base_url {
            config.base_url = url.trim_end_matches('/').to_string();
        }

        if let Some(value) = get("REASONER_TEMPERATURE") {
            config.temperature = parse_value("REASONER_TEMPERATURE", &value)?;
        }

        if let Some(value) = get("REASONER_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(parse_value("REASONER_TIMEOUT_SECS", &value)?);
        }

        if let Some(value) = get("REASONER_MAX_RETRIES") {
            config.retry.max_retries = parse_value("REASONER_MAX_RETRIES", &value)?;
        }

        if let Some(value) = get("REASONER_STEP_CONCURRENCY") {
            config.step_concurrency = parse_value("REASONER_STEP_CONCURRENCY", &value)?;
        }

        if let Some(value) = get("REASONER_REJECT_EMPTY_PLAN") {
            config.reject_empty_plan = parse_flag(&value);
        }

        Ok(config)
    }

    /// Check invariants that would otherwise surface as confusing backend errors.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(OrchestrationError::ConfigError(
                "Model name must not be empty".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(OrchestrationError::ConfigError(format!(
                "Temperature {} outside 0.0..=2.0",
                self.temperature
            )));
        }

        if self.step_concurrency == 0 {
            return Err(OrchestrationError::ConfigError(
                "Step concurrency must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Credential for backends that require one.
    pub fn require_api_key(&self) -> Result<&str> {
        match (&self.api_key, self.backend.api_key_var()) {
            (Some(key), _) => Ok(key.as_str()),
            (None, Some(var)) => Err(OrchestrationError::ConfigError(format!(
                "{} not configured for backend {}",
                var, self.backend
            ))),
            (None, None) => Ok(""),
        }
    }
}

impl fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentConfig")
            .field("backend", &self.backend)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("step_concurrency", &self.step_concurrency)
            .field("reject_empty_plan", &self.reject_empty_plan)
            .finish()
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        OrchestrationError::ConfigError(format!("Invalid value for {}: '{}'", key, value))
    })
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
