//! Engine configuration.
//!
//! Everything has a default, so a missing file is never fatal:
//!
//! ```
//! use prakriti_engine::EngineConfig;
//!
//! let cfg = EngineConfig::from_toml_str(r#"
//!     [scoring]
//!     dual_gap = 0.05
//!
//!     [model]
//!     model_dir = "/srv/prakriti/models"
//! "#).unwrap();
//!
//! assert_eq!(cfg.scoring.dual_gap, 0.05);
//! assert_eq!(cfg.scoring.low_threshold, 0.3);
//! assert_eq!(cfg.model.label_only_confidence, 0.75);
//! ```

use std::path::{Path, PathBuf};

use prakriti_core::ScoringCfg;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Directory holding the classifier artifact and its manifest.
pub const MODEL_DIR_ENV: &str = "MODEL_DIR";
/// `0`/`false`/`off` disables model augmentation.
pub const MODEL_ENABLED_ENV: &str = "PRAKRITI_MODEL_ENABLED";
/// Optional path to a TOML config file read by `EngineConfig::from_env`.
pub const CONFIG_PATH_ENV: &str = "PRAKRITI_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub scoring: ScoringCfg,
    pub model: ModelCfg,
    pub report: ReportCfg,
}

/// Classifier location and confidence shaping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelCfg {
    pub enabled: bool,
    pub model_dir: PathBuf,
    pub model_file: String,
    pub manifest_file: String,
    /// Top-two probability gap below which confidence is widened.
    pub tie_gap: f64,
    pub confidence_floor: f64,
    pub confidence_ceiling: f64,
    /// Reported confidence when the classifier only returns a label.
    pub label_only_confidence: f64,
}

impl Default for ModelCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            model_dir: PathBuf::from("./models_out"),
            model_file: "prakriti_model.json".to_string(),
            manifest_file: "feature_columns.json".to_string(),
            tie_gap: 0.1,
            confidence_floor: 0.6,
            confidence_ceiling: 0.95,
            label_only_confidence: 0.75,
        }
    }
}

impl ModelCfg {
    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join(&self.model_file)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.model_dir.join(&self.manifest_file)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportCfg {
    /// Decimal places kept in the percent breakdown.
    pub percent_decimals: u32,
}

impl Default for ReportCfg {
    fn default() -> Self {
        Self { percent_decimals: 1 }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file can't be read, is not valid TOML, or fails validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Defaults, or the file named by `PRAKRITI_CONFIG`, then environment overrides.
    ///
    /// An unreadable config file is logged and replaced by defaults.
    pub fn from_env() -> Self {
        let base = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::load(&path).unwrap_or_else(|e| {
                warn!(path = %Path::new(&path).display(), error = %e, "config file unusable; using defaults");
                Self::default()
            }),
            None => Self::default(),
        };
        base.with_env_overrides()
    }

    /// Apply `MODEL_DIR` and `PRAKRITI_MODEL_ENABLED` when set.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var(MODEL_DIR_ENV).ok().as_deref(),
            std::env::var(MODEL_ENABLED_ENV).ok().as_deref(),
        )
    }

    /// Same as `with_env_overrides`, with the values passed in explicitly.
    pub fn with_overrides(mut self, model_dir: Option<&str>, model_enabled: Option<&str>) -> Self {
        if let Some(dir) = model_dir.map(str::trim).filter(|d| !d.is_empty()) {
            self.model.model_dir = PathBuf::from(dir);
        }
        if let Some(flag) = model_enabled {
            match flag.trim().to_ascii_lowercase().as_str() {
                "0" | "false" | "off" | "no" => self.model.enabled = false,
                "1" | "true" | "on" | "yes" => self.model.enabled = true,
                other => warn!(value = other, "ignoring unrecognized {MODEL_ENABLED_ENV}"),
            }
        }
        self
    }

    pub fn with_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.model.model_dir = dir.into();
        self
    }

    pub fn without_model(mut self) -> Self {
        self.model.enabled = false;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scoring
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        let m = &self.model;
        let unit = |x: f64| x.is_finite() && (0.0..=1.0).contains(&x);
        if !unit(m.tie_gap) || !unit(m.label_only_confidence) {
            return Err(ConfigError::Invalid(
                "model.tie_gap and model.label_only_confidence must be within [0, 1]".to_string(),
            ));
        }
        if !unit(m.confidence_floor) || !unit(m.confidence_ceiling) || m.confidence_floor > m.confidence_ceiling {
            return Err(ConfigError::Invalid(format!(
                "model confidence bounds must satisfy 0 <= floor <= ceiling <= 1 (floor={}, ceiling={})",
                m.confidence_floor, m.confidence_ceiling
            )));
        }
        if m.model_file.trim().is_empty() || m.manifest_file.trim().is_empty() {
            return Err(ConfigError::Invalid("model file names must not be empty".to_string()));
        }
        if self.report.percent_decimals > 6 {
            return Err(ConfigError::Invalid(format!(
                "report.percent_decimals must be at most 6, got {}",
                self.report.percent_decimals
            )));
        }
        Ok(())
    }
}
