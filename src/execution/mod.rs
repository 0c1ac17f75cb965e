//! Step execution
//!
//! Each plan step is reasoned about on its own: the prompt carries the task
//! context, the goal and that one step, never the results of earlier steps.
//! The first failing call aborts the whole batch.

use crate::llm::LanguageModel;
use crate::models::{PlanStep, StepResult, TaskContext};
use crate::tasks::ReasoningTask;
use crate::Result;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

pub struct StepExecutor {
    model: Arc<dyn LanguageModel>,
    temperature: f32,
    concurrency: usize,
}

impl StepExecutor {
    pub fn new(model: Arc<dyn LanguageModel>, temperature: f32) -> Self {
        Self {
            model,
            temperature,
            concurrency: 1,
        }
    }

    /// Allow up to `concurrency` step calls in flight. Results keep plan order.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Reason about every step; output has the same length and order as `steps`.
    pub async fn execute_steps(
        &self,
        task: &dyn ReasoningTask,
        context: &TaskContext,
        goal: &str,
        steps: &[PlanStep],
    ) -> Result<Vec<StepResult>> {
        if steps.is_empty() {
            debug!(task = task.name(), "No steps to execute");
            return Ok(Vec::new());
        }

        debug!(
            task = task.name(),
            step_count = steps.len(),
            concurrency = self.concurrency,
            "Starting step execution"
        );

        let results = if self.concurrency == 1 {
            let mut results = Vec::with_capacity(steps.len());
            for (index, step) in steps.iter().enumerate() {
                results.push(self.execute_step(task, context, goal, index, step).await?);
            }
            results
        } else {
            // `buffered` yields in input order regardless of completion order.
            stream::iter(steps.iter().enumerate())
                .map(|(index, step)| self.execute_step(task, context, goal, index, step))
                .buffered(self.concurrency)
                .try_collect::<Vec<_>>()
                .await?
        };

        debug!(task = task.name(), result_count = results.len(), "Step execution completed");

        Ok(results)
    }

    async fn execute_step(
        &self,
        task: &dyn ReasoningTask,
        context: &TaskContext,
        goal: &str,
        index: usize,
        step: &PlanStep,
    ) -> Result<StepResult> {
        let start = Instant::now();
        let prompt = task.step_prompt(context, goal, step);

        let reasoning = self
            .model
            .invoke(&prompt, self.temperature)
            .await
            .map_err(|e| {
                warn!(step_index = index + 1, step = %step, error = %e, "Step reasoning failed");
                e
            })?;

        debug!(
            step_index = index + 1,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Step reasoned"
        );

        Ok(StepResult {
            step: step.clone(),
            reasoning: reasoning.trim().to_string(),
        })
    }
}
