//! Risk Categories and Response Mapping

use crate::error::{RiskError, RiskResult};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use utoipa::ToSchema;

/// Number of risk classes the model predicts
pub const RISK_CLASS_COUNT: usize = 5;

/// Risk category, ordered by class index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskCategory {
    /// Class 0
    NonDiabetic,
    /// Class 1
    Low,
    /// Class 2
    Moderate,
    /// Class 3
    High,
    /// Class 4
    Critical,
}

/// All categories, position = class index
pub const RISK_CATEGORIES: [RiskCategory; RISK_CLASS_COUNT] = [
    RiskCategory::NonDiabetic,
    RiskCategory::Low,
    RiskCategory::Moderate,
    RiskCategory::High,
    RiskCategory::Critical,
];

impl RiskCategory {
    /// Category for a classifier label
    pub fn from_level(level: i64) -> RiskResult<Self> {
        usize::try_from(level)
            .ok()
            .and_then(|i| RISK_CATEGORIES.get(i).copied())
            .ok_or(RiskError::MappingIndex(level))
    }

    /// Class index
    pub fn level(self) -> u8 {
        self as u8
    }

    /// Lowercase response key
    pub const fn key(self) -> &'static str {
        match self {
            RiskCategory::NonDiabetic => "non-diabetic",
            RiskCategory::Low => "low",
            RiskCategory::Moderate => "moderate",
            RiskCategory::High => "high",
            RiskCategory::Critical => "critical",
        }
    }

    /// Human-readable label
    pub const fn label(self) -> &'static str {
        match self {
            RiskCategory::NonDiabetic => "Non-diabetic",
            RiskCategory::Low => "Low Risk",
            RiskCategory::Moderate => "Moderate Risk",
            RiskCategory::High => "High Risk",
            RiskCategory::Critical => "Critical Risk",
        }
    }
}

/// Probability per risk category. Serializes as a display-label map in class order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskProbabilities([f64; RISK_CLASS_COUNT]);

impl RiskProbabilities {
    /// Probability of one category
    pub fn get(&self, category: RiskCategory) -> f64 {
        self.0[category.level() as usize]
    }

    /// `(category, probability)` pairs in class order
    pub fn iter(&self) -> impl Iterator<Item = (RiskCategory, f64)> + '_ {
        RISK_CATEGORIES.iter().copied().zip(self.0.iter().copied())
    }

    /// Sum of all probabilities
    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }
}

impl Serialize for RiskProbabilities {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(RISK_CLASS_COUNT))?;
        for (category, p) in self.iter() {
            map.serialize_entry(category.label(), &p)?;
        }
        map.end()
    }
}

/// Prediction response body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct PredictionResult {
    /// One of `non-diabetic`, `low`, `moderate`, `high`, `critical`
    #[schema(value_type = String, example = "low")]
    pub risk_category: RiskCategory,
    /// Class index 0-4
    pub risk_level: u8,
    /// Probability keyed by display label
    #[schema(value_type = Object)]
    pub probabilities: RiskProbabilities,
}

/// Map a classifier label and probability row to a response
pub fn map_prediction(label: i64, probabilities: &[f64]) -> RiskResult<PredictionResult> {
    let category = RiskCategory::from_level(label)?;
    let probabilities = <[f64; RISK_CLASS_COUNT]>::try_from(probabilities).map_err(|_| {
        RiskError::ModelInvocation(format!(
            "expected {RISK_CLASS_COUNT} class probabilities, got {}",
            probabilities.len()
        ))
    })?;

    Ok(PredictionResult {
        risk_category: category,
        risk_level: category.level(),
        probabilities: RiskProbabilities(probabilities),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    const PROBS: [f64; 5] = [0.1, 0.6, 0.2, 0.07, 0.03];

    #[test]
    fn test_key_and_label_tables() {
        let keys: Vec<_> = RISK_CATEGORIES.iter().map(|c| c.key()).collect();
        assert_eq!(keys, ["non-diabetic", "low", "moderate", "high", "critical"]);
        let labels: Vec<_> = RISK_CATEGORIES.iter().map(|c| c.label()).collect();
        assert_eq!(
            labels,
            ["Non-diabetic", "Low Risk", "Moderate Risk", "High Risk", "Critical Risk"]
        );
        for (i, c) in RISK_CATEGORIES.iter().enumerate() {
            assert_eq!(c.level() as usize, i);
            assert_eq!(serde_json::to_value(c).unwrap(), c.key());
        }
    }

    #[test]
    fn test_map_prediction() {
        let result = assert_ok!(map_prediction(1, &PROBS));
        assert_eq!(result.risk_category, RiskCategory::Low);
        assert_eq!(result.risk_level, 1);
        assert_eq!(result.probabilities.get(RiskCategory::Moderate), 0.2);
        assert!((result.probabilities.total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_range_label() {
        for label in [-1, 5, 42] {
            let err = assert_err!(map_prediction(label, &PROBS));
            assert!(matches!(err, RiskError::MappingIndex(l) if l == label));
        }
    }

    #[test]
    fn test_wrong_probability_count() {
        let err = assert_err!(map_prediction(0, &[0.5, 0.5]));
        assert!(matches!(err, RiskError::ModelInvocation(_)));
    }

    #[test]
    fn test_serialized_shape() {
        let result = assert_ok!(map_prediction(4, &PROBS));
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(
            json,
            r#"{"risk_category":"critical","risk_level":4,"probabilities":{"Non-diabetic":0.1,"Low Risk":0.6,"Moderate Risk":0.2,"High Risk":0.07,"Critical Risk":0.03}}"#
        );
    }
}
