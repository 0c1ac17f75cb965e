//! Chain-of-Thought Agents
//!
//! Multi-step reasoning agents on top of a text-generation model:
//! - Financial advice for a client profile and investment goals
//! - Fraud risk assessment for a card transaction against its history
//! - Personalized product recommendations with explanations
//!
//! REASONING CHAIN:
//! CONTEXT → PLAN → REASON PER STEP → SUMMARIZE
//!
//! Every model call goes through [`llm::LanguageModel`], so hosted, local
//! and mock backends are interchangeable.

pub mod agent;
pub mod audit;
pub mod config;
pub mod error;
pub mod execution;
pub mod features;
pub mod llm;
pub mod models;
pub mod planner;
pub mod recommendation;
pub mod report;
pub mod summarizer;
pub mod tasks;

pub use error::Result;

// Re-export common types
pub use agent::{FraudAnalysis, Orchestrator};
pub use config::{AgentConfig, Backend};
pub use models::*;
pub use report::{parse_fraud_report, FraudReport};
