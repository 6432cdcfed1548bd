//! GlucoGuard AI Engine
//!
//! Diabetes risk classification over a pre-trained model artifact.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        RISK INFERENCE PIPELINE                          │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐                   │
//! │  │    Input     │  │   Feature    │  │   Feature    │                   │
//! │  │  Validator   │─▶│   Deriver    │─▶│  Assembler   │                   │
//! │  │ (10 fields)  │  │ (BMI / age)  │  │ (12 columns) │                   │
//! │  └──────────────┘  └──────────────┘  └──────┬───────┘                   │
//! │                                             │                           │
//! │  ┌──────────────────────────────────────────▼────────────────────────┐  │
//! │  │                    SCALER / MODEL ADAPTER                         │  │
//! │  │        StandardScaler | MinMaxScaler → Logistic | Forest          │  │
//! │  └──────────────────────────────────────────┬────────────────────────┘  │
//! │                                             │                           │
//! │  ┌──────────────────────────────────────────▼────────────────────────┐  │
//! │  │                       RESPONSE MAPPER                             │  │
//! │  │        risk_level → risk_category + labelled probabilities        │  │
//! │  └───────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The artifact is loaded once at startup into a [`ModelArtifact`] and shared
//! read-only by every request through [`RiskPipeline`].

#![warn(missing_docs)]

pub mod artifact;
pub mod config;
pub mod error;
pub mod features;
pub mod models;
pub mod pipeline;
pub mod risk;
pub mod routes;
pub mod stats;
pub mod validation;

pub use artifact::{ArtifactInfo, ModelArtifact};
pub use config::EngineConfig;
pub use error::{ArtifactError, ErrorKind, FieldError, RiskError, RiskResult};
pub use features::{DerivedFeatures, Feature, FeatureVector, PatientInput, FEATURE_ORDER};
pub use models::{Classification, Classifier, Scaler};
pub use pipeline::RiskPipeline;
pub use risk::{PredictionResult, RiskCategory};
pub use routes::{build_router, AppState};
