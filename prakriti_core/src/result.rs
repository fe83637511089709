use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::affinity::AffinityTable;
use crate::answer::{normalize_answers, Answer};
use crate::classify::{classify, Constitution};
use crate::cfg::ScoringCfg;
use crate::dosha::{Distribution, Dosha};
use crate::score::{score_pairs, HeuristicScore};

/// Which path produced the final distribution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Affinity-table scoring only.
    Heuristic,
    /// Classifier-only output; `assemble` does not produce it.
    Model,
    /// Classifier output is authoritative; heuristic kept alongside.
    Hybrid,
    /// Nothing usable: fixed near-uniform distribution.
    Fallback,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Heuristic => "heuristic",
            Method::Model => "model",
            Method::Hybrid => "hybrid",
            Method::Fallback => "fallback",
        }
    }
}

/// Classifier output for one request.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ModelPrediction {
    pub predicted: Dosha,
    pub confidence: f64,
    pub distribution: Distribution,
    /// False when the classifier only produced a label and `distribution` is the heuristic one.
    pub calibrated: bool,
}

/// Final answer for one request. Every field is always populated.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConstitutionResult {
    pub distribution: Distribution,
    pub dominant: Dosha,
    pub secondary: Dosha,
    pub composite_label: String,
    pub confidence: f64,
    pub method: Method,
    /// Heuristic distribution, even when the model result is authoritative.
    pub heuristic: Distribution,
    pub total_weight: f64,
    pub usable_answers: usize,
    pub total_questions: usize,
    pub model: Option<ModelPrediction>,
}

impl ConstitutionResult {
    /// Result used when no answers were usable, or when the pipeline failed outright.
    pub fn fallback(total_questions: usize) -> Self {
        let dist = Distribution::FALLBACK;
        let c = classify(&dist, &ScoringCfg::default());
        Self {
            distribution: dist,
            dominant: c.dominant,
            secondary: c.secondary,
            composite_label: c.constitution.label(),
            confidence: c.confidence,
            method: Method::Fallback,
            heuristic: dist,
            total_weight: 0.0,
            usable_answers: 0,
            total_questions,
            model: None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.method == Method::Fallback
    }
}

/// Combine the heuristic score with an optional model prediction.
///
/// - heuristic unusable         -> `Fallback` (any model output is discarded)
/// - model present              -> `Hybrid`
/// - no model                   -> `Heuristic`
pub fn assemble(
    score: &HeuristicScore,
    model: Option<ModelPrediction>,
    total_questions: usize,
    cfg: &ScoringCfg,
) -> ConstitutionResult {
    if score.is_fallback() {
        if model.is_some() {
            debug!("no usable answers; ignoring model output");
        }
        return ConstitutionResult::fallback(total_questions);
    }
    let Some(m) = model else {
        let c = classify(&score.distribution, cfg);
        return ConstitutionResult {
            distribution: score.distribution,
            dominant: c.dominant,
            secondary: c.secondary,
            composite_label: c.constitution.label(),
            confidence: c.confidence,
            method: Method::Heuristic,
            heuristic: score.distribution,
            total_weight: score.total_weight,
            usable_answers: score.usable,
            total_questions,
            model: None,
        };
    };

    let method = Method::Hybrid;
    let c = classify(&m.distribution, cfg);

    // A label-only model may disagree with the distribution it was handed.
    let (secondary, constitution) = if c.dominant == m.predicted {
        (c.secondary, c.constitution)
    } else {
        (c.dominant, Constitution::Single(m.predicted))
    };
    debug!(method = method.as_str(), predicted = %m.predicted, confidence = m.confidence, "model result accepted");

    ConstitutionResult {
        distribution: m.distribution,
        dominant: m.predicted,
        secondary,
        composite_label: constitution.label(),
        confidence: m.confidence.clamp(0.0, 1.0),
        method,
        heuristic: score.distribution,
        total_weight: score.total_weight,
        usable_answers: score.usable,
        total_questions,
        model: Some(m),
    }
}

/// Heuristic-only prediction over already parsed answers, using the canonical affinity table.
///
/// Stateless convenience for callers that never load a classifier.
pub fn predict_heuristic(answers: &[Answer], cfg: &ScoringCfg) -> ConstitutionResult {
    let pairs = normalize_answers(answers, cfg);
    let score = score_pairs(&pairs, AffinityTable::canonical(), cfg);
    assemble(&score, None, answers.len(), cfg)
}
