//! Model Artifact
//!
//! The artifact is a JSON bundle holding a fitted scaler under `scaler` and
//! a fitted classifier under `best_model`:
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "feature_names": ["age", "bmi", "..."],
//!   "scaler": { "kind": "standard", "mean": [...], "scale": [...] },
//!   "best_model": { "kind": "logistic_regression", "classes": [0, 1, 2, 3, 4],
//!                   "coef": [[...], ...], "intercept": [...] }
//! }
//! ```
//!
//! Loading checks every fitted object against the 12-feature, 5-class schema
//! so a stale or drifted artifact stops the process before it serves.

use crate::error::ArtifactError;
use crate::features::{feature_names, FEATURE_COUNT};
use crate::models::{
    Classifier, DecisionTree, LogisticRegression, MinMaxScaler, RandomForest, Scaler, StandardScaler,
};
use crate::risk::RISK_CLASS_COUNT;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::time::Instant;
use utoipa::ToSchema;

/// Key of the fitted classifier
pub const MODEL_KEY: &str = "best_model";
/// Key of the fitted scaler
pub const SCALER_KEY: &str = "scaler";
/// Supported bundle format
pub const FORMAT_VERSION: u64 = 1;

/// Serialized scaler
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerSpec {
    /// `(x - mean) / scale`
    Standard {
        /// Per-column mean
        mean: Vec<f64>,
        /// Per-column standard deviation
        scale: Vec<f64>,
    },
    /// `x * scale + min`
    MinMax {
        /// Per-column offset
        min: Vec<f64>,
        /// Per-column factor
        scale: Vec<f64>,
    },
}

impl ScalerSpec {
    /// Build the runtime scaler
    pub fn build(self) -> Result<Box<dyn Scaler>, ArtifactError> {
        Ok(match self {
            ScalerSpec::Standard { mean, scale } => Box::new(StandardScaler::new(mean, scale)?),
            ScalerSpec::MinMax { min, scale } => Box::new(MinMaxScaler::new(min, scale)?),
        })
    }
}

/// Serialized classifier
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierSpec {
    /// Multinomial logistic regression
    LogisticRegression {
        /// Class labels
        #[serde(default = "default_classes")]
        classes: Vec<i64>,
        /// One coefficient row per class
        coef: Vec<Vec<f64>>,
        /// One intercept per class
        intercept: Vec<f64>,
    },
    /// Random forest of decision trees
    RandomForest {
        /// Class labels
        #[serde(default = "default_classes")]
        classes: Vec<i64>,
        /// Fitted trees
        trees: Vec<DecisionTree>,
    },
}

fn default_classes() -> Vec<i64> {
    (0..RISK_CLASS_COUNT as i64).collect()
}

impl ClassifierSpec {
    /// Build the runtime classifier
    pub fn build(self) -> Result<Box<dyn Classifier>, ArtifactError> {
        Ok(match self {
            ClassifierSpec::LogisticRegression { classes, coef, intercept } => {
                Box::new(LogisticRegression::new(classes, coef, intercept)?)
            }
            ClassifierSpec::RandomForest { classes, trees } => {
                Box::new(RandomForest::new(classes, trees, FEATURE_COUNT)?)
            }
        })
    }
}

/// Description of the loaded artifact
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ArtifactInfo {
    /// Scaler type
    pub scaler_kind: String,
    /// Classifier type
    pub classifier_kind: String,
    /// Feature columns in model order
    pub feature_names: Vec<String>,
    /// Class labels in probability order
    pub classes: Vec<i64>,
    /// File the artifact came from
    pub source: Option<String>,
    /// When the artifact was loaded
    pub loaded_at: DateTime<Utc>,
}

/// Fitted scaler and classifier, immutable after construction
pub struct ModelArtifact {
    scaler: Box<dyn Scaler>,
    classifier: Box<dyn Classifier>,
    info: ArtifactInfo,
}

impl ModelArtifact {
    /// Wrap fitted objects after checking them against the feature and class schema
    pub fn new(scaler: Box<dyn Scaler>, classifier: Box<dyn Classifier>) -> Result<Self, ArtifactError> {
        if scaler.n_features() != FEATURE_COUNT {
            return Err(ArtifactError::Schema(format!(
                "scaler fitted on {} features, expected {FEATURE_COUNT}",
                scaler.n_features()
            )));
        }
        if classifier.n_features() != FEATURE_COUNT {
            return Err(ArtifactError::Schema(format!(
                "classifier fitted on {} features, expected {FEATURE_COUNT}",
                classifier.n_features()
            )));
        }
        if classifier.classes().len() != RISK_CLASS_COUNT {
            return Err(ArtifactError::Schema(format!(
                "classifier has {} classes, expected {RISK_CLASS_COUNT}",
                classifier.classes().len()
            )));
        }
        // Probability columns are read positionally as risk levels
        if !classifier.classes().iter().copied().eq(0..RISK_CLASS_COUNT as i64) {
            return Err(ArtifactError::Schema(format!(
                "classifier classes {:?} must be [0, 1, 2, 3, 4] in order",
                classifier.classes()
            )));
        }

        let info = ArtifactInfo {
            scaler_kind: scaler.kind().into(),
            classifier_kind: classifier.kind().into(),
            feature_names: feature_names().iter().map(|s| s.to_string()).collect(),
            classes: classifier.classes().to_vec(),
            source: None,
            loaded_at: Utc::now(),
        };
        Ok(Self { scaler, classifier, info })
    }

    /// Parse a JSON bundle
    pub fn from_json_str(json: &str) -> Result<Self, ArtifactError> {
        let mut bundle: Value = serde_json::from_str(json)?;
        let obj = bundle
            .as_object_mut()
            .ok_or_else(|| ArtifactError::Schema("bundle must be a JSON object".into()))?;

        if let Some(version) = obj.get("format_version") {
            if version.as_u64() != Some(FORMAT_VERSION) {
                return Err(ArtifactError::Schema(format!(
                    "unsupported format_version {version}, expected {FORMAT_VERSION}"
                )));
            }
        }
        if let Some(names) = obj.remove("feature_names") {
            let names: Vec<String> = serde_json::from_value(names)?;
            if names != feature_names() {
                return Err(ArtifactError::Schema(format!(
                    "feature_names {names:?} do not match {:?}",
                    feature_names()
                )));
            }
        }

        let scaler: ScalerSpec = serde_json::from_value(obj.remove(SCALER_KEY).ok_or(ArtifactError::MissingKey(SCALER_KEY))?)?;
        let model: ClassifierSpec = serde_json::from_value(obj.remove(MODEL_KEY).ok_or(ArtifactError::MissingKey(MODEL_KEY))?)?;

        Self::new(scaler.build()?, model.build()?)
    }

    /// Read and parse a bundle from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        tracing::info!("Loading model artifact from {}", path.display());
        let start = Instant::now();

        let json = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut artifact = Self::from_json_str(&json)?;
        artifact.info.source = Some(path.display().to_string());

        tracing::info!(
            scaler = artifact.info.scaler_kind.as_str(),
            classifier = artifact.info.classifier_kind.as_str(),
            "Model artifact loaded in {:.2}ms",
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(artifact)
    }

    /// Fitted scaler
    pub fn scaler(&self) -> &dyn Scaler {
        self.scaler.as_ref()
    }

    /// Fitted classifier
    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    /// Artifact description
    pub fn info(&self) -> &ArtifactInfo {
        &self.info
    }
}

impl fmt::Debug for ModelArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelArtifact").field("info", &self.info).finish()
    }
}
