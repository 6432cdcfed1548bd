//! Error types

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

/// A single problem with one request field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    /// Field name as it appears in the request body
    pub field: String,
    /// What is wrong with it
    pub message: String,
}

impl FieldError {
    /// Create a field error
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Per-request pipeline failures
#[derive(Debug, Error)]
pub enum RiskError {
    /// Missing, malformed or mistyped input fields
    #[error("validation error: {}", describe_fields(.0))]
    Validation(Vec<FieldError>),
    /// Scaling or classification failed, or produced unusable output
    #[error("model invocation error: {0}")]
    ModelInvocation(String),
    /// Classifier returned a label with no risk category
    #[error("class label {0} has no risk category")]
    MappingIndex(i64),
}

/// Coarse failure class used by the HTTP boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Caller sent bad input
    Validation,
    /// Model or artifact anomaly
    Internal,
}

impl RiskError {
    /// Failure class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            RiskError::Validation(_) => ErrorKind::Validation,
            RiskError::ModelInvocation(_) | RiskError::MappingIndex(_) => ErrorKind::Internal,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            RiskError::Validation(_) => "validation_error",
            RiskError::ModelInvocation(_) => "model_invocation_error",
            RiskError::MappingIndex(_) => "mapping_index_error",
        }
    }

    /// Shorthand for a single-field validation failure
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        RiskError::Validation(vec![FieldError::new(field, message)])
    }
}

fn describe_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failures while loading the model artifact at startup
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// Artifact file could not be read
    #[error("failed to read artifact {}: {source}", .path.display())]
    Io {
        /// Path that was read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
    /// Artifact is not valid JSON or a section has the wrong shape
    #[error("artifact is not a valid bundle: {0}")]
    Parse(#[from] serde_json::Error),
    /// A required top-level key is absent
    #[error("artifact is missing `{0}`")]
    MissingKey(&'static str),
    /// Fitted objects disagree with the feature or class schema
    #[error("artifact schema mismatch: {0}")]
    Schema(String),
}

/// Result type for request-scoped operations
pub type RiskResult<T> = Result<T, RiskError>;
