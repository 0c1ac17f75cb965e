//! Fraud-risk assessment of one transaction against the user's history

use super::{numbered, ReasoningTask};
use crate::features::FeatureSummary;
use crate::models::{PlanStep, TaskContext, Transaction};
use crate::Result;

pub const TRANSACTION_LABEL: &str = "current transaction";
pub const FEATURES_LABEL: &str = "user history summary";

/// Goal used when the caller does not phrase one
pub const DEFAULT_GOAL: &str = "Assess the fraud risk of the current transaction";

const FRAUD_CHECKLIST: &[&str] = &[
    "Analyze location patterns and whether the current transaction location is suspicious",
    "Evaluate transaction amount in relation to user's typical spending",
    "Consider the merchant category and if it aligns with user's normal habits",
    "Assess transaction timing and frequency compared to patterns",
    "Identify specific fraud indicators present in this transaction",
    "Provide a fraud risk score (0-100) with explanation in a json format",
];

const REPORT_FORMAT: &str = r#"{
  "fraud_risk_score": <0-100>,
  "risk_level": "<Low|Medium|High>",
  "explanation": "..."
}"#;

pub struct FraudAnalysisTask;

impl FraudAnalysisTask {
    pub fn context(transaction: &Transaction, features: &FeatureSummary) -> Result<TaskContext> {
        TaskContext::new()
            .with_serialized(TRANSACTION_LABEL, transaction)?
            .with_serialized(FEATURES_LABEL, features)
    }
}

impl ReasoningTask for FraudAnalysisTask {
    fn name(&self) -> &'static str {
        "fraud_analysis"
    }

    fn plan_prompt(&self, context: &TaskContext, goal: &str) -> String {
        format!(
            r#"You are a financial fraud analyst.
Your task is to analyze this transaction step-by-step.

{}

GOAL:
{}

Write a clear step-by-step plan to assess fraud risk (numbered steps)."#,
            context.render(),
            goal.trim()
        )
    }

    fn step_prompt(&self, context: &TaskContext, goal: &str, step: &PlanStep) -> String {
        format!(
            r#"Given the following transaction and user data, perform this step:
Step: {}

GOAL:
{}

{}"#,
            step,
            goal.trim(),
            context.render_compact()
        )
    }

    fn summary_prompt(&self, reasoning_log: &str) -> String {
        format!(
            r#"Based on the analysis steps below, summarize the fraud risk as a JSON object with this format:

{}

Analysis Steps:
{}"#,
            REPORT_FORMAT, reasoning_log
        )
    }

    fn direct_prompt(&self, context: &TaskContext, goal: &str) -> String {
        format!(
            r#"Analyze this financial transaction for potential fraud:

{}

GOAL:
{}

Think step-by-step to determine if this transaction is fraudulent:
{}"#,
            context.render(),
            goal.trim(),
            numbered(FRAUD_CHECKLIST)
        )
    }
}
