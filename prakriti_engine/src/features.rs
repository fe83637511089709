//! Feature adapter: turn raw answers into the classifier's input vector.
//!
//! This module is intentionally policy-light:
//! - No IO
//! - Feature order comes only from the manifest
//! - Traits the manifest does not name are ignored
//!
//! `ManifestFeatureBuilder` covers the manifest format shipped with the classifier artifact.

use std::collections::HashMap;

use prakriti_core::{normalize_answers, Answer, ScoringCfg};
use serde_json::Value;

use crate::manifest::{FeatureKind, FeatureManifest, ANSWER_COUNT_FEATURE};

/// Trait: map answers into one feature vector.
pub trait FeatureBuilder {
    fn build(&self, answers: &[Answer]) -> Vec<f64>;
}

#[derive(Default)]
struct Accum {
    sum: f64,
    count: usize,
}

impl Accum {
    fn push(&mut self, w: f64) {
        self.sum += w;
        self.count += 1;
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Builds vectors in manifest order:
/// - graded      -> mean weight of the answers that name the feature (neutral 0.5)
/// - count       -> number of answers that name the feature (neutral 0)
/// - categorical -> 1-based index of the first level found in the answer's text (neutral 0)
///
/// An answer names a feature through its trait, or through a `question_mapping` entry for its
/// `questionId`, and feeds each feature at most once (the trait wins). Question-mapped
/// graded/count features read a numeric `value`, falling back to the answer's weight.
#[derive(Clone, Debug)]
pub struct ManifestFeatureBuilder<'m> {
    pub manifest: &'m FeatureManifest,
    pub scoring: ScoringCfg,
}

impl<'m> ManifestFeatureBuilder<'m> {
    pub fn new(manifest: &'m FeatureManifest, scoring: ScoringCfg) -> Self {
        Self { manifest, scoring }
    }

    fn level_index(&self, feature: &str, value: &Value) -> Option<f64> {
        let text = match value {
            Value::String(s) => s.to_ascii_lowercase(),
            Value::Number(n) => return n.as_f64().filter(|x| x.is_finite() && *x >= 0.0),
            _ => return None,
        };
        self.manifest
            .levels(feature)?
            .iter()
            .position(|level| text.contains(level.as_str()))
            .map(|i| (i + 1) as f64)
    }
}

impl FeatureBuilder for ManifestFeatureBuilder<'_> {
    fn build(&self, answers: &[Answer]) -> Vec<f64> {
        let pairs = normalize_answers(answers, &self.scoring);

        let mut graded: HashMap<&str, Accum> = HashMap::new();
        for p in &pairs {
            if self.manifest.kind_of(&p.trait_name).is_some() {
                graded.entry(p.trait_name.as_str()).or_default().push(p.weight);
            }
        }

        let mut categorical: HashMap<&str, f64> = HashMap::new();
        for a in answers {
            let Some(feature) = a
                .question_id
                .as_deref()
                .and_then(|q| self.manifest.feature_for_question(q))
            else {
                continue;
            };
            // A trait naming the same feature was already counted above.
            if a.trait_key().as_deref() == Some(feature) {
                continue;
            }
            match self.manifest.kind_of(feature) {
                Some(FeatureKind::Categorical) => {
                    if let Some(idx) = a.value.as_ref().and_then(|v| self.level_index(feature, v)) {
                        // Later answers win, as with a form re-submission.
                        categorical.insert(feature, idx);
                    }
                }
                Some(_) => {
                    let numeric = a.value.as_ref().and_then(Value::as_f64).filter(|x| x.is_finite());
                    if let Some(w) = numeric.or(a.weight.filter(|x| x.is_finite())) {
                        graded.entry(feature).or_default().push(w.clamp(0.0, 1.0));
                    }
                }
                None => {}
            }
        }

        self.manifest
            .features()
            .iter()
            .map(|f| match f.kind {
                FeatureKind::Graded => graded
                    .get(f.name.as_str())
                    .and_then(Accum::mean)
                    .unwrap_or_else(|| f.kind.neutral()),
                FeatureKind::Count if f.name == ANSWER_COUNT_FEATURE => pairs.len() as f64,
                FeatureKind::Count => graded
                    .get(f.name.as_str())
                    .map(|a| a.count as f64)
                    .unwrap_or_else(|| f.kind.neutral()),
                FeatureKind::Categorical => categorical
                    .get(f.name.as_str())
                    .copied()
                    .unwrap_or_else(|| f.kind.neutral()),
            })
            .collect()
    }
}

