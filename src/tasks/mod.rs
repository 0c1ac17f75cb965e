//! Prompt variants for the reasoning pipeline
//!
//! A [`ReasoningTask`] owns the wording of every prompt in one domain.
//! The planner, step executor and summarizer stay domain-agnostic.

use crate::models::{PlanStep, TaskContext};

pub mod financial;
pub mod fraud;

pub use financial::FinancialAdvisorTask;
pub use fraud::FraudAnalysisTask;

/// Prompt templates for one domain variant
pub trait ReasoningTask: Send + Sync {
    fn name(&self) -> &'static str;

    /// Ask for a numbered list of reasoning steps
    fn plan_prompt(&self, context: &TaskContext, goal: &str) -> String;

    /// Ask the model to reason through a single step
    fn step_prompt(&self, context: &TaskContext, goal: &str, step: &PlanStep) -> String;

    /// Ask for the consolidated answer from the reasoning log
    fn summary_prompt(&self, reasoning_log: &str) -> String;

    /// Single prompt with the reasoning steps written in by hand
    fn direct_prompt(&self, context: &TaskContext, goal: &str) -> String;
}

/// Numbered list, one item per line
pub(crate) fn numbered(items: &[&str]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item))
        .collect::<Vec<_>>()
        .join("\n")
}
