//! Inference Statistics
//!
//! Counters kept by the HTTP layer. The pipeline never reads them.

use crate::error::ErrorKind;
use crate::risk::{RiskCategory, RISK_CATEGORIES};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use utoipa::ToSchema;

/// Inference statistics
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InferenceStats {
    /// Successful predictions
    pub total_predictions: u64,
    /// Requests rejected by validation
    pub validation_failures: u64,
    /// Requests that failed inside the model stages
    pub internal_failures: u64,
    /// Successful predictions per risk category
    #[schema(value_type = Object)]
    pub by_category: BTreeMap<RiskCategory, u64>,
    /// Cumulative latency of all handled requests
    pub total_latency_us: u64,
}

impl Default for InferenceStats {
    fn default() -> Self {
        Self {
            total_predictions: 0,
            validation_failures: 0,
            internal_failures: 0,
            by_category: RISK_CATEGORIES.iter().map(|c| (*c, 0)).collect(),
            total_latency_us: 0,
        }
    }
}

impl InferenceStats {
    /// Record a successful prediction
    pub fn record_prediction(&mut self, category: RiskCategory, elapsed: Duration) {
        self.total_predictions += 1;
        *self.by_category.entry(category).or_default() += 1;
        self.total_latency_us += elapsed.as_micros() as u64;
    }

    /// Record a failed request
    pub fn record_failure(&mut self, kind: ErrorKind, elapsed: Duration) {
        match kind {
            ErrorKind::Validation => self.validation_failures += 1,
            ErrorKind::Internal => self.internal_failures += 1,
        }
        self.total_latency_us += elapsed.as_micros() as u64;
    }

    /// All handled requests
    pub fn total_requests(&self) -> u64 {
        self.total_predictions + self.validation_failures + self.internal_failures
    }

    /// Average latency in microseconds
    pub fn avg_latency_us(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 { 0.0 }
        else { self.total_latency_us as f64 / total as f64 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let mut stats = InferenceStats::default();
        assert_eq!(stats.avg_latency_us(), 0.0);
        assert_eq!(stats.by_category.len(), 5);

        stats.record_prediction(RiskCategory::High, Duration::from_micros(300));
        stats.record_prediction(RiskCategory::High, Duration::from_micros(100));
        stats.record_failure(ErrorKind::Validation, Duration::from_micros(20));
        stats.record_failure(ErrorKind::Internal, Duration::from_micros(180));

        assert_eq!(stats.total_predictions, 2);
        assert_eq!(stats.by_category[&RiskCategory::High], 2);
        assert_eq!(stats.by_category[&RiskCategory::Low], 0);
        assert_eq!(stats.total_requests(), 4);
        assert_eq!(stats.avg_latency_us(), 150.0);
    }

    #[test]
    fn test_serializes_categories_by_key() {
        let json = serde_json::to_value(InferenceStats::default()).unwrap();
        let keys: Vec<_> = json["by_category"].as_object().unwrap().keys().cloned().collect();
        assert!(keys.contains(&"non-diabetic".to_string()));
        assert!(keys.contains(&"critical".to_string()));
    }
}
