//! Final-answer summarization
//!
//! Folds the per-step reasoning into one log and asks the model for the
//! consolidated answer. The answer comes back as raw text.

use crate::llm::LanguageModel;
use crate::models::StepResult;
use crate::tasks::ReasoningTask;
use crate::Result;
use std::sync::Arc;
use tracing::{info, warn};

/// Each pair as `step\nreasoning`, pairs separated by a newline, in result order.
pub fn format_reasoning_log(results: &[StepResult]) -> String {
    results
        .iter()
        .map(|r| format!("{}\n{}", r.step, r.reasoning))
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct Summarizer {
    model: Arc<dyn LanguageModel>,
    temperature: f32,
}

impl Summarizer {
    pub fn new(model: Arc<dyn LanguageModel>, temperature: f32) -> Self {
        Self { model, temperature }
    }

    pub async fn summarize(&self, task: &dyn ReasoningTask, results: &[StepResult]) -> Result<String> {
        if results.is_empty() {
            warn!(task = task.name(), "Summarizing an empty reasoning log");
        }

        let reasoning_log = format_reasoning_log(results);
        let prompt = task.summary_prompt(&reasoning_log);

        info!(
            task = task.name(),
            step_count = results.len(),
            log_chars = reasoning_log.len(),
            "Requesting final answer"
        );

        self.model.invoke(&prompt, self.temperature).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockModel;
    use crate::models::PlanStep;
    use crate::tasks::{FinancialAdvisorTask, FraudAnalysisTask};

    fn result(step: &str, reasoning: &str) -> StepResult {
        StepResult {
            step: PlanStep::new(step),
            reasoning: reasoning.to_string(),
        }
    }

    #[test]
    fn test_log_preserves_order() {
        let results = vec![
            result("1. Check risk", "Moderate."),
            result("2. Check amount", "Large."),
            result("3. Conclude", "Review."),
        ];
        assert_eq!(
            format_reasoning_log(&results),
            "1. Check risk\nModerate.\n2. Check amount\nLarge.\n3. Conclude\nReview."
        );
    }

    #[test]
    fn test_empty_log() {
        assert_eq!(format_reasoning_log(&[]), "");
    }

    #[tokio::test]
    async fn test_summary_returns_raw_text() {
        let raw = "Here you go: {\"fraud_risk_score\": 91 ... (truncated";
        let model = Arc::new(MockModel::scripted([raw]));
        let summarizer = Summarizer::new(model.clone(), 0.0);

        let answer = summarizer
            .summarize(&FraudAnalysisTask, &[result("1. Check location", "Foreign.")])
            .await
            .unwrap();

        assert_eq!(answer, raw);
        assert!(model.calls()[0].prompt.contains("1. Check location\nForeign."));
    }

    #[tokio::test]
    async fn test_empty_results_still_summarized() {
        let model = Arc::new(MockModel::scripted(["No analysis available."]));
        let summarizer = Summarizer::new(model.clone(), 0.0);

        let answer = summarizer.summarize(&FinancialAdvisorTask, &[]).await.unwrap();

        assert_eq!(answer, "No analysis available.");
        assert_eq!(model.call_count(), 1);
    }
}
