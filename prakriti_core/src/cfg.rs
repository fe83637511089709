use serde::{Deserialize, Serialize};

use crate::error::ScoringError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringCfg {
    /// Weights below this fall in the `low` bucket.
    pub low_threshold: f64,
    /// Weights at or above this fall in the `high` bucket.
    pub high_threshold: f64,
    /// top - third below this labels the result "tridoshic".
    pub tridoshic_gap: f64,
    /// top - second below this labels the result as a dual type.
    pub dual_gap: f64,
    /// Weight used when an answer has none (or a non-numeric one).
    pub default_weight: f64,
}

impl Default for ScoringCfg {
    fn default() -> Self {
        Self {
            low_threshold: 0.3,
            high_threshold: 0.7,
            tridoshic_gap: 0.1,
            dual_gap: 0.1,
            default_weight: 0.5,
        }
    }
}

impl ScoringCfg {
    pub fn validate(&self) -> Result<(), ScoringError> {
        let unit = |x: f64| x.is_finite() && (0.0..=1.0).contains(&x);
        if !unit(self.low_threshold)
            || !unit(self.high_threshold)
            || self.low_threshold > self.high_threshold
        {
            return Err(ScoringError::Thresholds {
                low: self.low_threshold,
                high: self.high_threshold,
            });
        }
        for (name, v) in [
            ("tridoshic_gap", self.tridoshic_gap),
            ("dual_gap", self.dual_gap),
            ("default_weight", self.default_weight),
        ] {
            if !unit(v) {
                return Err(ScoringError::OutOfRange { name, value: v });
            }
        }
        Ok(())
    }
}
