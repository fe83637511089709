//! Caller-facing response shape. All percent scaling and rounding happens here and nowhere else.

use serde::Serialize;

use crate::dosha::{Distribution, Dosha};
use crate::result::{ConstitutionResult, Method};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ModelBlock {
    pub predicted: Dosha,
    pub confidence: f64,
    pub probabilities: Distribution,
    pub calibrated: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PrakritiBlock {
    pub vata: f64,
    pub pitta: f64,
    pub kapha: f64,
    pub dominant: Dosha,
    pub secondary: Dosha,
    #[serde(rename = "type")]
    pub composite_label: String,
    pub percent: Distribution,
    pub heuristic: Distribution,
    pub ml_prediction: Option<ModelBlock>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeaturesUsed {
    pub total_questions: usize,
    pub usable_answers: usize,
    pub total_weight: f64,
    pub calculation_method: Method,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConstitutionReport {
    pub prakriti: PrakritiBlock,
    pub confidence: f64,
    pub features_used: FeaturesUsed,
}

impl ConstitutionReport {
    /// Build the report, rounding percentages to `percent_decimals` places.
    pub fn new(r: &ConstitutionResult, percent_decimals: u32) -> Self {
        let d = r.distribution;
        ConstitutionReport {
            prakriti: PrakritiBlock {
                vata: d.vata,
                pitta: d.pitta,
                kapha: d.kapha,
                dominant: r.dominant,
                secondary: r.secondary,
                composite_label: r.composite_label.clone(),
                percent: d.percent(percent_decimals),
                heuristic: r.heuristic,
                ml_prediction: r.model.as_ref().map(|m| ModelBlock {
                    predicted: m.predicted,
                    confidence: m.confidence,
                    probabilities: m.distribution,
                    calibrated: m.calibrated,
                }),
            },
            confidence: r.confidence,
            features_used: FeaturesUsed {
                total_questions: r.total_questions,
                usable_answers: r.usable_answers,
                total_weight: r.total_weight,
                calculation_method: r.method,
            },
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        // Every field is a plain number, string, or nested struct of those.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl ConstitutionResult {
    pub fn report(&self, percent_decimals: u32) -> ConstitutionReport {
        ConstitutionReport::new(self, percent_decimals)
    }
}
