use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ScoringError {
    #[error("affinity for `{trait_name}` ({bucket}) is not a probability simplex point: {values:?}")]
    NotSimplex {
        trait_name: String,
        bucket: &'static str,
        values: [f64; 3],
    },

    #[error("bucket thresholds must satisfy 0 <= low <= high <= 1 (low={low}, high={high})")]
    Thresholds { low: f64, high: f64 },

    #[error("{name} must be within [0, 1], got {value}")]
    OutOfRange { name: &'static str, value: f64 },

    #[error("`{0}` is a category name and cannot be a characteristic trait")]
    ReservedTrait(String),
}
