use std::path::PathBuf;

use thiserror::Error;

/// Why a classifier could not be used. Never surfaced past `ModelAugmenter`.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model augmentation disabled by configuration")]
    Disabled,

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid feature manifest: {0}")]
    Manifest(String),

    #[error("invalid model artifact: {0}")]
    Artifact(String),

    #[error("feature dimension mismatch: expected {expected}, got {got}")]
    Dimension { expected: usize, got: usize },

    #[error("classifier failed: {0}")]
    Classifier(String),
}
