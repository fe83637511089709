//! Prediction assembler.
//!
//! Outside-world facing entry point around `prakriti_core`:
//! - parses loosely shaped payloads
//! - runs the heuristic scorer
//! - asks the `ModelAugmenter` for a classifier result
//! - assembles one complete `ConstitutionResult`
//!
//! No async. Each call owns its accumulators; the only shared state is the read-only affinity
//! table and the augmenter's load-once model.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use prakriti_core::{
    assemble, normalize_answers, parse_answers, score_pairs, AffinityTable, Answer, ConstitutionReport,
    ConstitutionResult, ScoringCfg,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::augmenter::ModelAugmenter;
use crate::config::{EngineConfig, ReportCfg};

/// Health/status snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EngineStatus {
    pub model_loaded: bool,
    pub model_kind: Option<String>,
    pub feature_count: usize,
    pub load_attempts: usize,
}

#[derive(Debug)]
pub struct ConstitutionEngine {
    scoring: ScoringCfg,
    report: ReportCfg,
    /// `None` uses the canonical process-wide table.
    table: Option<Arc<AffinityTable>>,
    augmenter: Option<Arc<ModelAugmenter>>,
}

impl ConstitutionEngine {
    /// Engine with its own augmenter (unless the model is disabled).
    pub fn new(cfg: EngineConfig) -> Self {
        let augmenter = cfg
            .model
            .enabled
            .then(|| Arc::new(ModelAugmenter::from_config(&cfg)));
        Self {
            scoring: cfg.scoring,
            report: cfg.report,
            table: None,
            augmenter,
        }
    }

    /// Engine configured from the environment, sharing the process-wide augmenter.
    pub fn from_env() -> Self {
        let cfg = EngineConfig::from_env();
        Self {
            scoring: cfg.scoring,
            report: cfg.report,
            table: None,
            augmenter: Some(ModelAugmenter::global()),
        }
    }

    /// Heuristic-only engine.
    pub fn heuristic(cfg: EngineConfig) -> Self {
        Self::new(cfg.without_model())
    }

    pub fn with_augmenter(mut self, augmenter: Arc<ModelAugmenter>) -> Self {
        self.augmenter = Some(augmenter);
        self
    }

    pub fn without_augmenter(mut self) -> Self {
        self.augmenter = None;
        self
    }

    pub fn with_affinity_table(mut self, table: Arc<AffinityTable>) -> Self {
        self.table = Some(table);
        self
    }

    pub fn scoring(&self) -> &ScoringCfg {
        &self.scoring
    }

    pub fn table(&self) -> &AffinityTable {
        match &self.table {
            Some(t) => &**t,
            None => AffinityTable::canonical(),
        }
    }

    /// Eagerly load the classifier (e.g. at startup). Returns whether one is available.
    pub fn warm_up(&self) -> bool {
        self.augmenter.as_ref().is_some_and(|a| a.load())
    }

    pub fn status(&self) -> EngineStatus {
        let model = self.augmenter.as_ref().and_then(|a| a.model());
        EngineStatus {
            model_loaded: model.is_some(),
            model_kind: model.map(|m| m.classifier.kind().to_string()),
            feature_count: model.map_or(0, |m| m.manifest.len()),
            load_attempts: self.augmenter.as_ref().map_or(0, |a| a.load_attempts()),
        }
    }

    /// Predict from parsed answers. Never panics past this call; an internal failure yields the
    /// fallback result.
    pub fn predict(&self, answers: &[Answer]) -> ConstitutionResult {
        match catch_unwind(AssertUnwindSafe(|| self.predict_inner(answers))) {
            Ok(r) => r,
            Err(_) => {
                error!(answers = answers.len(), "prediction pipeline panicked; returning fallback");
                ConstitutionResult::fallback(answers.len())
            }
        }
    }

    fn predict_inner(&self, answers: &[Answer]) -> ConstitutionResult {
        let pairs = normalize_answers(answers, &self.scoring);
        let score = score_pairs(&pairs, self.table(), &self.scoring);
        // Nothing usable answered: the classifier would only see neutral features.
        let model = if score.is_fallback() {
            None
        } else {
            self.augmenter
                .as_ref()
                .and_then(|a| a.predict(answers, &score.distribution))
        };

        let result = assemble(&score, model, answers.len(), &self.scoring);
        debug!(
            answers = answers.len(),
            pairs = pairs.len(),
            total_weight = score.total_weight,
            method = result.method.as_str(),
            label = %result.composite_label,
            confidence = result.confidence,
            "constitution assembled"
        );
        result
    }

    /// Predict from any accepted payload shape.
    pub fn predict_value(&self, payload: &Value) -> ConstitutionResult {
        match catch_unwind(AssertUnwindSafe(|| parse_answers(payload))) {
            Ok(answers) => self.predict(&answers),
            Err(_) => {
                error!("payload parsing panicked; returning fallback");
                ConstitutionResult::fallback(0)
            }
        }
    }

    /// Predict and serialize into the caller-facing report.
    pub fn report(&self, payload: &Value) -> ConstitutionReport {
        self.predict_value(payload).report(self.report.percent_decimals)
    }
}

impl Default for ConstitutionEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
