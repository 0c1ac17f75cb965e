//! Plan generation
//!
//! One model call produces free text; the plan is whatever lines of that
//! text start with a digit. Anything else the model writes (preamble,
//! headings, bullet points) is ignored.

use crate::llm::LanguageModel;
use crate::models::{PlanStep, TaskContext};
use crate::tasks::ReasoningTask;
use crate::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Keep the trimmed lines whose first non-whitespace character is an ASCII digit.
///
/// Returns an empty plan when no line qualifies; that is not an error here.
pub fn parse_plan_steps(text: &str) -> Vec<PlanStep> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.chars().next().is_some_and(|c| c.is_ascii_digit()))
        .map(PlanStep::from)
        .collect()
}

/// Asks the model for a numbered reasoning plan
pub struct PlanGenerator {
    model: Arc<dyn LanguageModel>,
    temperature: f32,
}

impl PlanGenerator {
    pub fn new(model: Arc<dyn LanguageModel>, temperature: f32) -> Self {
        Self { model, temperature }
    }

    pub async fn generate_plan(
        &self,
        task: &dyn ReasoningTask,
        context: &TaskContext,
        goal: &str,
    ) -> Result<Vec<PlanStep>> {
        let prompt = task.plan_prompt(context, goal);

        debug!(task = task.name(), prompt_chars = prompt.len(), "Requesting plan");

        let response = self.model.invoke(&prompt, self.temperature).await?;
        let steps = parse_plan_steps(&response);

        if steps.is_empty() {
            warn!(
                task = task.name(),
                response_chars = response.len(),
                "Model returned no numbered plan lines"
            );
        } else {
            info!(task = task.name(), step_count = steps.len(), "Plan generated");
        }

        Ok(steps)
    }
}
