//! Core data models for the reasoning agents

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

//
// ================= Task Context =================
//

/// One named fact shown to the model, e.g. a client profile or a transaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextFact {
    pub label: String,
    pub value: Value,
}

/// Ordered domain facts shared by every prompt of one run
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TaskContext {
    facts: Vec<ContextFact>,
}

impl TaskContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fact. Labels are rendered upper-cased as prompt section headers.
    pub fn with(mut self, label: impl Into<String>, value: impl Into<Value>) -> Self {
        self.facts.push(ContextFact {
            label: label.into(),
            value: value.into(),
        });
        self
    }

    /// Append any serializable fact.
    pub fn with_serialized<T: Serialize>(self, label: impl Into<String>, value: &T) -> crate::Result<Self> {
        let value = serde_json::to_value(value)?;
        Ok(self.with(label, value))
    }

    pub fn get(&self, label: &str) -> Option<&Value> {
        self.facts
            .iter()
            .find(|f| f.label.eq_ignore_ascii_case(label))
            .map(|f| &f.value)
    }

    pub fn facts(&self) -> &[ContextFact] {
        &self.facts
    }

    /// Sections as `LABEL:\n<value>` with pretty-printed JSON, blank line between sections.
    pub fn render(&self) -> String {
        self.render_with(|v| serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string()))
    }

    /// Same sections with single-line JSON.
    pub fn render_compact(&self) -> String {
        self.render_with(Value::to_string)
    }

    fn render_with<F: Fn(&Value) -> String>(&self, json: F) -> String {
        self.facts
            .iter()
            .map(|fact| {
                let body = match &fact.value {
                    Value::String(s) => s.trim().to_string(),
                    other => json(other),
                };
                format!("{}:\n{}", fact.label.to_uppercase(), body)
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

//
// ================= Plan =================
//

/// One natural-language instruction from a generated plan
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanStep(String);

impl PlanStep {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlanStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for PlanStep {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PlanStep {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A step and the model's reasoning about it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub step: PlanStep,
    pub reasoning: String,
}

//
// ================= Run Output =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningRun {
    pub run_id: Uuid,
    pub task: String,
    pub context_hash: String,
    pub goal: String,
    pub plan: Vec<PlanStep>,
    pub step_results: Vec<StepResult>,
    pub final_answer: String,
    pub reasoning_trace: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

//
// ================= Transactions =================
//

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// ISO-8601, local or with an offset. Offset timestamps are stored as UTC.
    #[serde(deserialize_with = "iso_timestamp::deserialize")]
    pub timestamp: NaiveDateTime,
    pub amount: f64,
    pub merchant: String,
    pub merchant_category: String,
    pub location: String,
}

mod iso_timestamp {
    use chrono::{DateTime, NaiveDateTime};
    use serde::{de, Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid ISO-8601 timestamp '{}'", raw)))
    }

    pub(super) fn parse(raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        raw.parse::<NaiveDateTime>()
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|ts| ts.naive_utc()))
    }
}

//
// ================= Demo Inputs =================
//

/// Input for the financial advisor flows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisoryCase {
    pub user_profile: Value,
    pub investment_goals: String,
}

/// Input for the fraud analysis flows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudCase {
    pub transaction: Transaction,
    #[serde(default)]
    pub history: Vec<Transaction>,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_context_render_sections() {
        let context = TaskContext::new()
            .with("client profile", json!({"age": 42}))
            .with("investment goals", "  Save for college.\n");

        let rendered = context.render();
        assert!(rendered.starts_with("CLIENT PROFILE:\n{\n  \"age\": 42\n}"));
        assert!(rendered.ends_with("INVESTMENT GOALS:\nSave for college."));
        assert!(rendered.contains("}\n\nINVESTMENT GOALS:"));
    }

    #[test]
    fn test_context_render_compact() {
        let context = TaskContext::new().with("transaction", json!({"amount": 10.5}));
        assert_eq!(context.render_compact(), "TRANSACTION:\n{\"amount\":10.5}");
    }

    #[test]
    fn test_context_lookup_is_case_insensitive() {
        let context = TaskContext::new().with("Transaction", json!(1));
        assert_eq!(context.get("transaction"), Some(&json!(1)));
        assert!(context.get("history").is_none());
    }

    #[test]
    fn test_transaction_parses_iso_timestamp() {
        let raw = r#"{"timestamp": "2025-04-18T10:30:00", "amount": 42.15, "merchant": "Starbucks",
                      "merchant_category": "Food", "location": "New York"}"#;
        let tx: Transaction = serde_json::from_str(raw).unwrap();
        assert_eq!(tx.timestamp.to_string(), "2025-04-18 10:30:00");
        assert_eq!(tx.location, "New York");
    }

    #[test]
    fn test_transaction_accepts_offset_timestamps() {
        let parse = |ts: &str| {
            let raw = format!(
                r#"{{"timestamp": "{}", "amount": 1.0, "merchant": "m", "merchant_category": "c", "location": "l"}}"#,
                ts
            );
            serde_json::from_str::<Transaction>(&raw).map(|tx| tx.timestamp.to_string())
        };

        assert_eq!(parse("2025-04-18T10:30:00Z").unwrap(), "2025-04-18 10:30:00");
        assert_eq!(parse("2025-04-18T10:30:00+05:30").unwrap(), "2025-04-18 05:00:00");
        assert_eq!(parse("2025-04-18 10:30:00").unwrap(), "2025-04-18 10:30:00");
        assert!(parse("yesterday").is_err());
    }

    #[test]
    fn test_plan_step_serializes_as_string() {
        let step = PlanStep::new("1. Check risk");
        assert_eq!(serde_json::to_value(&step).unwrap(), json!("1. Check risk"));
        assert_eq!(step.to_string(), "1. Check risk");
    }
}
