//! Main orchestrator - implements the reasoning chain
//!
//! CONTEXT → PLAN → REASON PER STEP → SUMMARIZE
//!
//! A run costs one plan call, one call per parsed step and one summary
//! call. Nothing is kept between runs.

use crate::audit::compute_context_hash;
use crate::config::AgentConfig;
use crate::error::OrchestrationError;
use crate::execution::StepExecutor;
use crate::features::{extract_features, FeatureSummary};
use crate::llm::{build_model, LanguageModel};
use crate::models::{AdvisoryCase, FraudCase, ReasoningRun, TaskContext};
use crate::planner::PlanGenerator;
use crate::summarizer::Summarizer;
use crate::tasks::{FinancialAdvisorTask, FraudAnalysisTask, ReasoningTask};
use crate::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

/// Features computed for a transaction plus the reasoning run over them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudAnalysis {
    pub features: FeatureSummary,
    pub run: ReasoningRun,
}

pub struct Orchestrator {
    model: Arc<dyn LanguageModel>,
    planner: PlanGenerator,
    executor: StepExecutor,
    summarizer: Summarizer,
    temperature: f32,
    reject_empty_plan: bool,
}

impl Orchestrator {
    pub fn new(model: Arc<dyn LanguageModel>, config: &AgentConfig) -> Self {
        Self {
            planner: PlanGenerator::new(model.clone(), config.temperature),
            executor: StepExecutor::new(model.clone(), config.temperature)
                .with_concurrency(config.step_concurrency),
            summarizer: Summarizer::new(model.clone(), config.temperature),
            model,
            temperature: config.temperature,
            reject_empty_plan: config.reject_empty_plan,
        }
    }

    /// Build the configured backend and wire it into every stage.
    pub fn from_config(config: &AgentConfig) -> Result<Self> {
        let model = build_model(config)?;
        Ok(Self::new(model, config))
    }

    /// Run plan → steps → summary for one task.
    pub async fn run(
        &self,
        task: &dyn ReasoningTask,
        context: &TaskContext,
        goal: &str,
    ) -> Result<ReasoningRun> {
        let start_time = Instant::now();
        let started_at = Utc::now();
        let run_id = Uuid::new_v4();
        let context_hash = compute_context_hash(context, goal)?;
        let mut reasoning_trace = Vec::new();

        info!(
            run_id = %run_id,
            task = task.name(),
            backend = self.model.name(),
            "Orchestrator: starting run"
        );

        reasoning_trace.push(format!(
            "INPUT: {} facts, context {}",
            context.facts().len(),
            &context_hash[..context_hash.len().min(12)]
        ));

        // === PLAN ===
        let plan = self.planner.generate_plan(task, context, goal).await?;
        reasoning_trace.push(format!("PLAN: {} steps in plan", plan.len()));

        if plan.is_empty() && self.reject_empty_plan {
            return Err(OrchestrationError::InvalidPlan(
                "Model response contained no numbered steps".to_string(),
            ));
        }

        // === REASON ===
        let step_results = self
            .executor
            .execute_steps(task, context, goal, &plan)
            .await?;
        for (i, result) in step_results.iter().enumerate() {
            reasoning_trace.push(format!(
                "REASON: Step {} ({} chars)",
                i + 1,
                result.reasoning.len()
            ));
        }

        // === SUMMARIZE ===
        let final_answer = self.summarizer.summarize(task, &step_results).await?;
        reasoning_trace.push("COMPLETE: Final answer received".to_string());

        let elapsed_ms = start_time.elapsed().as_millis() as u64;

        info!(
            run_id = %run_id,
            step_count = step_results.len(),
            elapsed_ms,
            "Orchestrator: run complete"
        );

        Ok(ReasoningRun {
            run_id,
            task: task.name().to_string(),
            context_hash,
            goal: goal.to_string(),
            plan,
            step_results,
            final_answer,
            reasoning_trace,
            started_at,
            elapsed_ms,
        })
    }

    /// One call with the task's hand-written reasoning checklist.
    pub async fn run_direct(
        &self,
        task: &dyn ReasoningTask,
        context: &TaskContext,
        goal: &str,
    ) -> Result<String> {
        let prompt = task.direct_prompt(context, goal);
        debug!(task = task.name(), prompt_chars = prompt.len(), "Direct chain-of-thought call");
        self.model.invoke(&prompt, self.temperature).await
    }

    /// Investment advice for a client profile and goals.
    pub async fn advise(&self, case: &AdvisoryCase) -> Result<ReasoningRun> {
        let context = FinancialAdvisorTask::context(&case.user_profile);
        self.run(&FinancialAdvisorTask, &context, &case.investment_goals)
            .await
    }

    /// Extract history features, then reason about fraud risk.
    pub async fn analyze_transaction(&self, case: &FraudCase, goal: &str) -> Result<FraudAnalysis> {
        let features = extract_features(&case.transaction, &case.history);

        debug!(
            velocity_24h = features.transaction_velocity_24h,
            avg_amount = features.avg_transaction_amount,
            "Transaction features extracted"
        );

        let context = FraudAnalysisTask::context(&case.transaction, &features)?;
        let run = self.run(&FraudAnalysisTask, &context, goal).await?;

        Ok(FraudAnalysis { features, run })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Backend;
    use crate::llm::MockModel;
    use crate::models::{PlanStep, Transaction};
    use crate::tasks::fraud::DEFAULT_GOAL;
    use chrono::NaiveDateTime;
    use serde_json::json;

    fn config() -> AgentConfig {
        AgentConfig::new(Backend::Mock)
    }

    fn advisory_case() -> AdvisoryCase {
        AdvisoryCase {
            user_profile: json!({"age": 42, "income": 120000}),
            investment_goals: "Save for college and retirement.".to_string(),
        }
    }

    #[tokio::test]
    async fn test_run_makes_n_plus_two_calls() {
        let model = Arc::new(MockModel::scripted([
            "Plan:\n1. Assess risk\n2. Pick allocation\n3. Choose funds\nGood luck!",
            "Moderate risk.",
            "60/40 split.",
            "Index funds.",
            "Invest $1,500 monthly across index funds.",
        ]));
        let orchestrator = Orchestrator::new(model.clone(), &config());

        let run = orchestrator.advise(&advisory_case()).await.unwrap();

        assert_eq!(model.call_count(), 5);
        assert_eq!(
            run.plan,
            vec![
                PlanStep::new("1. Assess risk"),
                PlanStep::new("2. Pick allocation"),
                PlanStep::new("3. Choose funds"),
            ]
        );
        assert_eq!(run.step_results.len(), 3);
        assert_eq!(run.step_results[1].reasoning, "60/40 split.");
        assert_eq!(run.final_answer, "Invest $1,500 monthly across index funds.");
        assert_eq!(run.task, "financial_advice");

        let summary_prompt = &model.calls()[4].prompt;
        let first = summary_prompt.find("1. Assess risk\nModerate risk.").unwrap();
        let third = summary_prompt.find("3. Choose funds\nIndex funds.").unwrap();
        assert!(first < third);
    }

    #[tokio::test]
    async fn test_zero_step_plan_goes_straight_to_summary() {
        let model = Arc::new(MockModel::scripted([
            "I would rather just chat about it.",
            "Nothing to summarize.",
        ]));
        let orchestrator = Orchestrator::new(model.clone(), &config());

        let run = orchestrator.advise(&advisory_case()).await.unwrap();

        assert!(run.plan.is_empty());
        assert!(run.step_results.is_empty());
        assert_eq!(run.final_answer, "Nothing to summarize.");
        assert_eq!(model.call_count(), 2);
    }

    #[tokio::test]
    async fn test_reject_empty_plan_escalates() {
        let model = Arc::new(MockModel::scripted(["No numbered steps here."]));
        let mut strict = config();
        strict.reject_empty_plan = true;
        let orchestrator = Orchestrator::new(model.clone(), &strict);

        let result = orchestrator.advise(&advisory_case()).await;

        assert!(matches!(result, Err(OrchestrationError::InvalidPlan(_))));
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_plan_failure_propagates() {
        let model = Arc::new(MockModel::from_fn(|_| {
            Err(OrchestrationError::Authentication("invalid key".to_string()))
        }));
        let orchestrator = Orchestrator::new(model.clone(), &config());

        let result = orchestrator.advise(&advisory_case()).await;
        assert!(matches!(result, Err(OrchestrationError::Authentication(_))));
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_fraud_analysis_feeds_features_into_prompts() {
        let at = |s: &str| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap();
        let case = FraudCase {
            transaction: Transaction {
                timestamp: at("2025-04-19T03:45:00"),
                amount: 9999.99,
                merchant: "Electronics Store".to_string(),
                merchant_category: "Electronics".to_string(),
                location: "New Delhi".to_string(),
            },
            history: vec![Transaction {
                timestamp: at("2025-04-18T10:30:00"),
                amount: 42.15,
                merchant: "Starbucks".to_string(),
                merchant_category: "Food".to_string(),
                location: "New York".to_string(),
            }],
        };
        let model = Arc::new(MockModel::scripted([
            "1. Compare location",
            "Never seen New Delhi.",
            r#"{"fraud_risk_score": 88, "risk_level": "High", "explanation": "New city, huge amount."}"#,
        ]));
        let orchestrator = Orchestrator::new(model.clone(), &config());

        let analysis = orchestrator.analyze_transaction(&case, DEFAULT_GOAL).await.unwrap();

        assert_eq!(analysis.features.transaction_velocity_24h, 1);
        assert_eq!(analysis.run.task, "fraud_analysis");
        assert!(analysis.run.final_answer.contains("\"risk_level\": \"High\""));
        assert!(model.calls()[0].prompt.contains("\"highest_single_amount\": 42.15"));
    }

    #[tokio::test]
    async fn test_direct_mode_is_single_call() {
        let model = Arc::new(MockModel::scripted(["Balanced portfolio."]));
        let orchestrator = Orchestrator::new(model.clone(), &config());
        let case = advisory_case();
        let context = FinancialAdvisorTask::context(&case.user_profile);

        let answer = orchestrator
            .run_direct(&FinancialAdvisorTask, &context, &case.investment_goals)
            .await
            .unwrap();

        assert_eq!(answer, "Balanced portfolio.");
        assert_eq!(model.call_count(), 1);
        assert!(model.calls()[0].prompt.contains("Let's think through this step-by-step"));
    }

    #[tokio::test]
    async fn test_configured_temperature_reaches_every_call() {
        let model = Arc::new(MockModel::scripted(["1. Only step", "thought", "answer"]));
        let mut warm = config();
        warm.temperature = 0.4;
        let orchestrator = Orchestrator::new(model.clone(), &warm);

        orchestrator.advise(&advisory_case()).await.unwrap();

        assert!(model.calls().iter().all(|c| (c.temperature - 0.4).abs() < f32::EPSILON));
    }
}
