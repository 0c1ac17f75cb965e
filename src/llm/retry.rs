//! Bounded retry with capped exponential backoff for retryable backend errors

use super::LanguageModel;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(8);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. 0 disables retrying.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `retries_used + 1`.
    pub fn backoff(&self, retries_used: u32) -> Duration {
        let base_ms = self.base_delay.as_millis();
        if base_ms == 0 {
            return Duration::ZERO;
        }
        let max_ms = self.max_delay.as_millis().max(base_ms);
        let multiplier = 1u128 << retries_used.min(20);
        let backoff_ms = base_ms.saturating_mul(multiplier).min(max_ms);
        Duration::from_millis(u64::try_from(backoff_ms).unwrap_or(u64::MAX))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

/// Wraps a backend and retries only errors classified as retryable
pub struct RetryingModel {
    inner: Arc<dyn LanguageModel>,
    policy: RetryPolicy,
}

impl RetryingModel {
    pub fn new(inner: Arc<dyn LanguageModel>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl LanguageModel for RetryingModel {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn invoke(&self, prompt: &str, temperature: f32) -> Result<String> {
        let mut retries_used: u32 = 0;

        loop {
            match self.inner.invoke(prompt, temperature).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && retries_used < self.policy.max_retries => {
                    let delay = self.policy.backoff(retries_used);
                    retries_used += 1;

                    warn!(
                        backend = self.inner.name(),
                        error = %e,
                        retry_attempt = retries_used,
                        max_retries = self.policy.max_retries,
                        retry_in_ms = delay.as_millis() as u64,
                        "Retrying model call after retryable error"
                    );

                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}
