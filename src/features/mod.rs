//! Transaction feature extraction for fraud analysis
//!
//! Pure aggregation over a user's history. The summary is serialized into
//! the fraud prompts as the "user history summary".

use crate::models::Transaction;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Window used for transaction velocity
pub const VELOCITY_WINDOW_HOURS: i64 = 24;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSummary {
    pub avg_transaction_amount: f64,
    pub transaction_velocity_24h: usize,
    /// Locations seen more than once, sorted
    pub common_locations: Vec<String>,
    /// Distinct merchant categories, sorted
    pub usual_merchant_categories: Vec<String>,
    pub transaction_count_30d: usize,
    pub highest_single_amount: f64,
}

/// Summarize `history` relative to the `current` transaction.
///
/// Velocity counts every history entry whose timestamp is at most 24 hours
/// before the current one (`<=`, boundary included). Entries are compared
/// one by one, so history need not be sorted.
pub fn extract_features(current: &Transaction, history: &[Transaction]) -> FeatureSummary {
    let count = history.len();

    let (avg_transaction_amount, highest_single_amount) = if history.is_empty() {
        (0.0, 0.0)
    } else {
        let total: f64 = history.iter().map(|tx| tx.amount).sum();
        let highest = history
            .iter()
            .map(|tx| tx.amount)
            .fold(f64::NEG_INFINITY, f64::max);
        (total / count as f64, highest)
    };

    let window = Duration::hours(VELOCITY_WINDOW_HOURS);
    let transaction_velocity_24h = history
        .iter()
        .filter(|tx| current.timestamp - tx.timestamp <= window)
        .count();

    let mut location_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for tx in history {
        *location_counts.entry(tx.location.as_str()).or_insert(0) += 1;
    }
    let common_locations = location_counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(loc, _)| loc.to_string())
        .collect();

    let usual_merchant_categories = history
        .iter()
        .map(|tx| tx.merchant_category.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();

    FeatureSummary {
        avg_transaction_amount,
        transaction_velocity_24h,
        common_locations,
        usual_merchant_categories,
        transaction_count_30d: count,
        highest_single_amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn tx(timestamp: &str, amount: f64, category: &str, location: &str) -> Transaction {
        Transaction {
            timestamp: NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S").unwrap(),
            amount,
            merchant: "Merchant".to_string(),
            merchant_category: category.to_string(),
            location: location.to_string(),
        }
    }

    fn sample_history() -> Vec<Transaction> {
        vec![
            tx("2025-04-18T10:30:00", 42.15, "Food", "New York"),
            tx("2025-04-17T18:20:00", 125.30, "Grocery", "New York"),
            tx("2025-04-15T12:10:00", 85.00, "Retail", "Online"),
            tx("2025-04-12T09:15:00", 35.50, "Food", "New York"),
            tx("2025-04-10T20:20:00", 200.00, "Retail", "New York"),
        ]
    }

    fn suspicious() -> Transaction {
        tx("2025-04-19T03:45:00", 9999.99, "Electronics", "New Delhi")
    }

    #[test]
    fn test_sample_history_summary() {
        let features = extract_features(&suspicious(), &sample_history());

        assert_eq!(features.highest_single_amount, 200.00);
        assert_eq!((features.avg_transaction_amount * 100.0).round() / 100.0, 97.59);
        assert_eq!(features.transaction_velocity_24h, 1);
        assert_eq!(features.common_locations, vec!["New York"]);
        assert_eq!(features.usual_merchant_categories, vec!["Food", "Grocery", "Retail"]);
        assert_eq!(features.transaction_count_30d, 5);
    }

    #[test]
    fn test_empty_history_yields_zeroes() {
        let features = extract_features(&suspicious(), &[]);

        assert_eq!(features.avg_transaction_amount, 0.0);
        assert_eq!(features.highest_single_amount, 0.0);
        assert_eq!(features.transaction_velocity_24h, 0);
        assert!(features.common_locations.is_empty());
        assert!(features.usual_merchant_categories.is_empty());
        assert_eq!(features.transaction_count_30d, 0);
    }

    #[test]
    fn test_velocity_window_boundary_is_inclusive() {
        let current = tx("2025-04-19T12:00:00", 10.0, "Food", "Paris");
        let history = vec![
            tx("2025-04-18T12:00:00", 1.0, "Food", "Paris"),
            tx("2025-04-18T11:59:59", 1.0, "Food", "Paris"),
            tx("2025-04-19T11:00:00", 1.0, "Food", "Paris"),
        ];

        let features = extract_features(&current, &history);
        assert_eq!(features.transaction_velocity_24h, 2);
    }

    #[test]
    fn test_velocity_ignores_history_order() {
        let mut history = sample_history();
        history.reverse();
        let features = extract_features(&suspicious(), &history);
        assert_eq!(features.transaction_velocity_24h, 1);
    }

    #[test]
    fn test_single_location_not_common() {
        let history = vec![
            tx("2025-04-18T10:30:00", 5.0, "Food", "Lisbon"),
            tx("2025-04-17T10:30:00", 7.0, "Food", "Porto"),
        ];
        let features = extract_features(&suspicious(), &history);
        assert!(features.common_locations.is_empty());
        assert_eq!(features.usual_merchant_categories, vec!["Food"]);
        assert_eq!(features.avg_transaction_amount, 6.0);
    }

    #[test]
    fn test_summary_serializes_with_prompt_keys() {
        let features = extract_features(&suspicious(), &sample_history());
        let json = serde_json::to_value(&features).unwrap();
        assert_eq!(json["transaction_velocity_24h"], 1);
        assert_eq!(json["highest_single_amount"], 200.0);
    }
}
