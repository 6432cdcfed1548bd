//! Risk Inference Pipeline
//!
//! validate → derive → assemble → scale/classify → map. Stateless apart from
//! the shared read-only artifact.

use crate::artifact::ModelArtifact;
use crate::error::{RiskError, RiskResult};
use crate::features::{DerivedFeatures, FeatureVector, PatientInput};
use crate::models::Classification;
use crate::risk::{map_prediction, PredictionResult, RISK_CLASS_COUNT};
use crate::validation;
use std::sync::Arc;

/// Tolerance on the probability sum
const PROBABILITY_SUM_TOLERANCE: f64 = 1e-6;

/// Prediction pipeline over a loaded artifact
#[derive(Debug, Clone)]
pub struct RiskPipeline {
    artifact: Arc<ModelArtifact>,
}

impl RiskPipeline {
    /// Create a pipeline sharing `artifact`
    pub fn new(artifact: Arc<ModelArtifact>) -> Self {
        Self { artifact }
    }

    /// Loaded artifact
    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    /// Validate a raw JSON body, then predict
    pub fn predict_json(&self, body: &[u8]) -> RiskResult<PredictionResult> {
        let input = validation::parse_patient(body)?;
        self.predict(&input)
    }

    /// Predict the risk category for one patient
    pub fn predict(&self, input: &PatientInput) -> RiskResult<PredictionResult> {
        let derived = DerivedFeatures::derive(input);
        if derived.has_out_of_bins() {
            tracing::warn!(
                bmi = input.bmi,
                age = input.age,
                bmi_category = derived.bmi_category,
                age_group = derived.age_group,
                "Input outside binning range, passing sentinel to model"
            );
        }

        let features = FeatureVector::assemble(input, &derived);
        tracing::debug!(features = ?features.as_slice(), "Assembled feature vector");

        let classification = self.invoke(&features)?;
        map_prediction(classification.label, &classification.probabilities)
    }

    /// Scale and classify a single-row batch
    fn invoke(&self, features: &FeatureVector) -> RiskResult<Classification> {
        let scaled = self.artifact.scaler().transform(&features.to_batch())?;
        let mut rows = self.artifact.classifier().classify(&scaled)?;
        if rows.len() != 1 {
            return Err(RiskError::ModelInvocation(format!(
                "classifier returned {} rows for a single-row batch",
                rows.len()
            )));
        }
        let mut classification = rows.remove(0);
        check_distribution(&classification.probabilities)?;
        for p in &mut classification.probabilities {
            *p = p.clamp(0.0, 1.0);
        }
        Ok(classification)
    }
}

fn check_distribution(probabilities: &[f64]) -> RiskResult<()> {
    if probabilities.len() != RISK_CLASS_COUNT {
        return Err(RiskError::ModelInvocation(format!(
            "expected {RISK_CLASS_COUNT} class probabilities, got {}",
            probabilities.len()
        )));
    }
    let in_range = |p: &f64| p.is_finite() && (-PROBABILITY_SUM_TOLERANCE..=1.0 + PROBABILITY_SUM_TOLERANCE).contains(p);
    if !probabilities.iter().all(in_range) {
        return Err(RiskError::ModelInvocation(format!(
            "probabilities out of range: {probabilities:?}"
        )));
    }
    let total: f64 = probabilities.iter().sum();
    if (total - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
        return Err(RiskError::ModelInvocation(format!("probabilities sum to {total}")));
    }
    Ok(())
}
