//! Investment advice for a client profile and free-text goals

use super::{numbered, ReasoningTask};
use crate::models::{PlanStep, TaskContext};
use serde_json::Value;

pub const PROFILE_LABEL: &str = "client profile";

const ADVISOR_CHECKLIST: &[&str] = &[
    "Analyze the client's risk tolerance based on age, financial situation, and goals",
    "Consider current market conditions and economic factors",
    "Evaluate appropriate asset allocation (stocks, bonds, alternatives)",
    "Recommend specific investment vehicles and explain the rationale",
    "Address potential concerns and provide risk mitigation strategies",
];

pub struct FinancialAdvisorTask;

impl FinancialAdvisorTask {
    /// Context holding only the client profile; the goals travel as the goal text.
    pub fn context(profile: &Value) -> TaskContext {
        TaskContext::new().with(PROFILE_LABEL, profile.clone())
    }
}

impl ReasoningTask for FinancialAdvisorTask {
    fn name(&self) -> &'static str {
        "financial_advice"
    }

    fn plan_prompt(&self, context: &TaskContext, goal: &str) -> String {
        format!(
            r#"You are a financial planning assistant. A client has given you a profile and investment goals.

Your task is to generate a step-by-step reasoning plan to create an investment strategy.

{}

INVESTMENT GOALS:
{}

Generate a list of numbered reasoning steps to guide investment advice."#,
            context.render(),
            goal.trim()
        )
    }

    fn step_prompt(&self, context: &TaskContext, goal: &str, step: &PlanStep) -> String {
        format!(
            r#"You are a financial advisor. Using the information below, reason through this step:

{}

INVESTMENT GOALS:
{}

Step: {}

Thought:"#,
            context.render(),
            goal.trim(),
            step
        )
    }

    fn summary_prompt(&self, reasoning_log: &str) -> String {
        format!(
            r#"You are a financial planner. Summarize the findings and generate a final, personalized investment strategy based on the following step-by-step reasoning:

{}

Final Answer:"#,
            reasoning_log
        )
    }

    fn direct_prompt(&self, context: &TaskContext, goal: &str) -> String {
        format!(
            r#"As a financial advisor, provide investment recommendations for this client based only on information from the years 2020-2024:

{}

INVESTMENT GOALS:
{}

Let's think through this step-by-step:
{}"#,
            context.render(),
            goal.trim(),
            numbered(ADVISOR_CHECKLIST)
        )
    }
}
