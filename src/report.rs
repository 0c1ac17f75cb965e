//! Typed parsing of the fraud summary
//!
//! The orchestrator hands back whatever text the model wrote. Callers that
//! need the structured report run it through [`parse_fraud_report`].

use crate::models::RiskLevel;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudReport {
    pub fraud_risk_score: u8,
    pub risk_level: RiskLevel,
    pub explanation: String,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReportParseError {
    #[error("no JSON object found in model output")]
    MissingJson,

    #[error("malformed report JSON: {0}")]
    Malformed(String),

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("fraud_risk_score {0} outside 0-100")]
    ScoreOutOfRange(f64),

    #[error("unknown risk level '{0}'")]
    UnknownRiskLevel(String),
}

/// Parse and validate a fraud report from raw model output.
///
/// Accepts a JSON object anywhere in the text (fenced or not), or bare
/// `"key": value` lines without the surrounding braces.
pub fn parse_fraud_report(text: &str) -> Result<FraudReport, ReportParseError> {
    let candidate = locate_json(text).ok_or(ReportParseError::MissingJson)?;

    let json: Value = serde_json::from_str(&candidate)
        .map_err(|e| ReportParseError::Malformed(e.to_string()))?;

    let score = match json.get("fraud_risk_score") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or(ReportParseError::MissingField("fraud_risk_score"))?;

    if !(0.0..=100.0).contains(&score) {
        return Err(ReportParseError::ScoreOutOfRange(score));
    }

    let level = json
        .get("risk_level")
        .and_then(Value::as_str)
        .ok_or(ReportParseError::MissingField("risk_level"))?;

    let explanation = json
        .get("explanation")
        .and_then(Value::as_str)
        .ok_or(ReportParseError::MissingField("explanation"))?
        .trim()
        .to_string();

    Ok(FraudReport {
        fraud_risk_score: score.round() as u8,
        risk_level: parse_risk_level(level)?,
        explanation,
    })
}

fn parse_risk_level(level: &str) -> Result<RiskLevel, ReportParseError> {
    match level.trim().to_lowercase().as_str() {
        "low" => Ok(RiskLevel::Low),
        "medium" | "moderate" => Ok(RiskLevel::Medium),
        "high" => Ok(RiskLevel::High),
        _ => Err(ReportParseError::UnknownRiskLevel(level.to_string())),
    }
}

fn locate_json(text: &str) -> Option<String> {
    let cleaned = text
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    if let (Some(start), Some(end)) = (cleaned.find('{'), cleaned.rfind('}')) {
        if start < end {
            return Some(cleaned[start..=end].to_string());
        }
    }

    // Bare key/value lines, as the prompt's format example shows them.
    let fields: Vec<&str> = cleaned
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('"') && line.contains("\":"))
        .map(|line| line.trim_end_matches(','))
        .collect();

    if fields.is_empty() {
        None
    } else {
        Some(format!("{{{}}}", fields.join(",")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_object() {
        let report = parse_fraud_report(
            r#"{"fraud_risk_score": 92, "risk_level": "High", "explanation": "Unusual city and amount."}"#,
        )
        .unwrap();

        assert_eq!(report.fraud_risk_score, 92);
        assert_eq!(report.risk_level, RiskLevel::High);
        assert_eq!(report.explanation, "Unusual city and amount.");
    }

    #[test]
    fn test_fenced_object_with_prose() {
        let text = "Here is the assessment:\n```json\n{\n  \"fraud_risk_score\": \"35\",\n  \"risk_level\": \"low\",\n  \"explanation\": \"Matches habits.\"\n}\n```\nLet me know.";
        let report = parse_fraud_report(text).unwrap();
        assert_eq!(report.fraud_risk_score, 35);
        assert_eq!(report.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_bare_fields_without_braces() {
        let text = "  \"fraud_risk_score\": 60,\n  \"risk_level\": \"Medium\",\n  \"explanation\": \"Some red flags.\"";
        let report = parse_fraud_report(text).unwrap();
        assert_eq!(report.fraud_risk_score, 60);
        assert_eq!(report.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_no_json() {
        assert_eq!(
            parse_fraud_report("The transaction looks risky."),
            Err(ReportParseError::MissingJson)
        );
    }

    #[test]
    fn test_malformed_json() {
        let err = parse_fraud_report("{\"fraud_risk_score\": 10, \"risk_level\": }").unwrap_err();
        assert!(matches!(err, ReportParseError::Malformed(_)));
    }

    #[test]
    fn test_score_out_of_range() {
        let err = parse_fraud_report(
            r#"{"fraud_risk_score": 140, "risk_level": "High", "explanation": "x"}"#,
        )
        .unwrap_err();
        assert_eq!(err, ReportParseError::ScoreOutOfRange(140.0));
    }

    #[test]
    fn test_unknown_level_and_missing_field() {
        let unknown = parse_fraud_report(
            r#"{"fraud_risk_score": 10, "risk_level": "Critical", "explanation": "x"}"#,
        )
        .unwrap_err();
        assert_eq!(unknown, ReportParseError::UnknownRiskLevel("Critical".to_string()));

        let missing = parse_fraud_report(r#"{"fraud_risk_score": 10, "risk_level": "Low"}"#)
            .unwrap_err();
        assert_eq!(missing, ReportParseError::MissingField("explanation"));
    }
}
