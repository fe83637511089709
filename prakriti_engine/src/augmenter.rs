//! Optional classifier refinement.
//!
//! The artifact is read at most once per `ModelAugmenter` (behind a `OnceLock`): concurrent
//! first callers block on the same initialization and never see a half-built model. After
//! that the loaded model is read-only.
//!
//! Nothing here returns an error to the caller. Load failures make the augmenter unavailable;
//! per-request failures make `predict` return `None`.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use prakriti_core::{Answer, Distribution, Dosha, ModelPrediction, ScoringCfg};
use tracing::{debug, info, warn};

use crate::classifier::{Classifier, ClassifierOutput, ModelArtifact};
use crate::config::{EngineConfig, ModelCfg};
use crate::error::ModelError;
use crate::features::{FeatureBuilder, ManifestFeatureBuilder};
use crate::manifest::FeatureManifest;

/// A classifier together with the manifest describing its input.
#[derive(Debug)]
pub struct LoadedModel {
    pub manifest: FeatureManifest,
    pub classifier: Box<dyn Classifier>,
}

impl LoadedModel {
    pub fn new(manifest: FeatureManifest, classifier: Box<dyn Classifier>) -> Self {
        Self {
            manifest,
            classifier,
        }
    }

    /// Read `manifest_file` and `model_file` from `model_dir`.
    pub fn load(cfg: &ModelCfg) -> Result<Self, ModelError> {
        if !cfg.enabled {
            return Err(ModelError::Disabled);
        }
        let manifest = FeatureManifest::load(cfg.manifest_path())?;
        let classifier = ModelArtifact::load(cfg.model_path())?.into_classifier()?;
        if classifier.n_features() != manifest.len() {
            // Kept loaded; every request will be skipped by the dimension check.
            warn!(
                manifest = manifest.len(),
                classifier = classifier.n_features(),
                "classifier input width does not match the feature manifest"
            );
        }
        Ok(Self::new(manifest, classifier))
    }
}

#[derive(Debug)]
pub struct ModelAugmenter {
    cfg: ModelCfg,
    scoring: ScoringCfg,
    model: OnceLock<Option<LoadedModel>>,
    load_attempts: AtomicUsize,
}

impl ModelAugmenter {
    /// Augmenter that reads its artifact from `cfg.model_dir` on first use.
    pub fn new(cfg: ModelCfg, scoring: ScoringCfg) -> Self {
        Self {
            cfg,
            scoring,
            model: OnceLock::new(),
            load_attempts: AtomicUsize::new(0),
        }
    }

    pub fn from_config(cfg: &EngineConfig) -> Self {
        Self::new(cfg.model.clone(), cfg.scoring.clone())
    }

    /// Augmenter around an already built model. No file access happens.
    pub fn with_model(model: LoadedModel, cfg: ModelCfg, scoring: ScoringCfg) -> Self {
        let aug = Self::new(cfg, scoring);
        let _ = aug.model.set(Some(model));
        aug
    }

    /// Augmenter that never has a model.
    pub fn unavailable() -> Self {
        let aug = Self::new(ModelCfg::default(), ScoringCfg::default());
        let _ = aug.model.set(None);
        aug
    }

    /// Process-wide augmenter built from `EngineConfig::from_env()`.
    pub fn global() -> Arc<ModelAugmenter> {
        static GLOBAL: OnceLock<Arc<ModelAugmenter>> = OnceLock::new();
        GLOBAL
            .get_or_init(|| Arc::new(ModelAugmenter::from_config(&EngineConfig::from_env())))
            .clone()
    }

    /// Load the artifact if that has not happened yet. Returns whether a model is available.
    ///
    /// Idempotent: only the first call touches the filesystem.
    pub fn load(&self) -> bool {
        self.loaded().is_some()
    }

    fn loaded(&self) -> Option<&LoadedModel> {
        self.model
            .get_or_init(|| {
                self.load_attempts.fetch_add(1, Ordering::Relaxed);
                match LoadedModel::load(&self.cfg) {
                    Ok(m) => {
                        info!(
                            kind = m.classifier.kind(),
                            features = m.manifest.len(),
                            dir = %self.cfg.model_dir.display(),
                            "classifier loaded"
                        );
                        Some(m)
                    }
                    Err(ModelError::Disabled) => {
                        debug!("model augmentation disabled");
                        None
                    }
                    Err(e) => {
                        warn!(error = %e, dir = %self.cfg.model_dir.display(), "classifier unavailable; heuristic only");
                        None
                    }
                }
            })
            .as_ref()
    }

    /// Whether a model is loaded, without triggering a load.
    pub fn is_loaded(&self) -> bool {
        matches!(self.model.get(), Some(Some(_)))
    }

    /// How many times the artifact was read from storage (0 or 1).
    pub fn load_attempts(&self) -> usize {
        self.load_attempts.load(Ordering::Relaxed)
    }

    pub fn model(&self) -> Option<&LoadedModel> {
        self.loaded()
    }

    pub fn cfg(&self) -> &ModelCfg {
        &self.cfg
    }

    /// Classifier prediction for these answers, or `None` when no model is usable for them.
    ///
    /// `heuristic` stands in as the distribution when the classifier only returns a label.
    pub fn predict(&self, answers: &[Answer], heuristic: &Distribution) -> Option<ModelPrediction> {
        let model = self.loaded()?;
        match self.try_predict(model, answers, heuristic) {
            Ok(p) => Some(p),
            Err(e) => {
                warn!(error = %e, "classifier skipped for this request");
                None
            }
        }
    }

    fn try_predict(
        &self,
        model: &LoadedModel,
        answers: &[Answer],
        heuristic: &Distribution,
    ) -> Result<ModelPrediction, ModelError> {
        let x = ManifestFeatureBuilder::new(&model.manifest, self.scoring.clone()).build(answers);
        for expected in [model.manifest.len(), model.classifier.n_features()] {
            if x.len() != expected {
                return Err(ModelError::Dimension {
                    expected,
                    got: x.len(),
                });
            }
        }

        let output = catch_unwind(AssertUnwindSafe(|| model.classifier.predict(&x)))
            .map_err(|_| ModelError::Classifier("classifier panicked".to_string()))??;

        match output {
            ClassifierOutput::Probabilities(probs) => from_probabilities(&probs, &self.cfg),
            ClassifierOutput::Label(predicted) => Ok(ModelPrediction {
                predicted,
                confidence: self.cfg.label_only_confidence,
                distribution: *heuristic,
                calibrated: false,
            }),
        }
    }
}

/// Turn class probabilities into a prediction.
///
/// Confidence is the top probability. When the top two are within `tie_gap`, it becomes
/// `clamp(top + (top - second), floor, ceiling)`.
pub fn from_probabilities(probs: &[(Dosha, f64)], cfg: &ModelCfg) -> Result<ModelPrediction, ModelError> {
    let mut raw = Distribution::ZERO;
    for &(d, p) in probs {
        raw.add(d, p);
    }
    let distribution = raw
        .renormalized()
        .ok_or_else(|| ModelError::Classifier(format!("probabilities do not form a distribution: {probs:?}")))?;

    let [(predicted, top), (_, second), _] = distribution.ranked();
    let gap = top - second;
    let confidence = if gap < cfg.tie_gap {
        (top + gap).clamp(cfg.confidence_floor, cfg.confidence_ceiling)
    } else {
        top
    };

    Ok(ModelPrediction {
        predicted,
        confidence,
        distribution,
        calibrated: true,
    })
}
