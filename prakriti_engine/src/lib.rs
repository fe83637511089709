//! prakriti_engine
//!
//! Outside-world facing orchestration layer for `prakriti_core`.
//!
//! Responsibilities:
//! - load configuration (TOML file + environment)
//! - load the optional classifier artifact once per process
//! - convert answers into classifier features via the manifest
//! - assemble heuristic and classifier output into one result
//!
//! Non-goals:
//! - no HTTP, no async
//! - no scoring policy (lives in core)
//! - no training

pub mod augmenter;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod features;
pub mod manifest;

pub use augmenter::{
    ModelAugmenter,
    LoadedModel,
    from_probabilities,
};

pub use classifier::{
    Classifier,
    ClassifierOutput,
    SoftmaxClassifier,
    CentroidClassifier,
    ModelArtifact,
};

pub use config::{EngineConfig, ModelCfg, ReportCfg, ConfigError};
pub use engine::{ConstitutionEngine, EngineStatus};
pub use error::ModelError;
pub use features::{FeatureBuilder, ManifestFeatureBuilder};
pub use manifest::{FeatureKind, FeatureManifest, FeatureSpec, ANSWER_COUNT_FEATURE};
