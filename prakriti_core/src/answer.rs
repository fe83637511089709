//! Answer parsing: turn a loosely shaped questionnaire payload into `(trait, weight)` pairs.
//!
//! Accepted shapes:
//! - a list of answer records: `[{"trait": "vata", "weight": 0.8}, ...]`
//! - an envelope: `{"answers": [...]}`
//! - a question-id mapping: `{"q1": "Thin, light", "q2": {"trait": "skin", "weight": 0.2}}`
//!
//! Nothing here fails. Records without a trait are kept as `Answer`s (the model path may still
//! use their `questionId`/`value`) but produce no `TraitPair`.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::cfg::ScoringCfg;

/// One questionnaire answer as submitted.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Answer {
    #[serde(rename = "trait", skip_serializing_if = "Option::is_none")]
    pub trait_name: Option<String>,
    /// `None` when missing or not numeric.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(rename = "questionId", skip_serializing_if = "Option::is_none")]
    pub question_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Answer {
    pub fn new(trait_name: impl Into<String>, weight: f64) -> Self {
        Self {
            trait_name: Some(trait_name.into()),
            weight: Some(weight),
            question_id: None,
            value: None,
        }
    }

    /// An answer that only carries a question id and its raw value.
    pub fn question(question_id: impl Into<String>, value: Value) -> Self {
        Self {
            trait_name: None,
            weight: None,
            question_id: Some(question_id.into()),
            value: Some(value),
        }
    }

    pub fn with_question_id(mut self, question_id: impl Into<String>) -> Self {
        self.question_id = Some(question_id.into());
        self
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    /// Read one record. Unknown keys are ignored; wrong-typed fields become `None`.
    pub fn from_object(obj: &Map<String, Value>) -> Self {
        Self {
            trait_name: obj.get("trait").and_then(Value::as_str).map(str::to_string),
            weight: obj.get("weight").and_then(numeric),
            question_id: obj
                .get("questionId")
                .or_else(|| obj.get("question_id"))
                .and_then(scalar_string),
            value: obj.get("value").filter(|v| !v.is_null()).cloned(),
        }
    }

    /// Normalized trait key: trimmed, lowercase, `None` when empty.
    pub fn trait_key(&self) -> Option<String> {
        let t = self.trait_name.as_deref()?.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_ascii_lowercase())
        }
    }

    /// Weight clamped to [0, 1]; missing or non-finite weights take `default`.
    pub fn weight_or(&self, default: f64) -> f64 {
        match self.weight {
            Some(w) if w.is_finite() => w.clamp(0.0, 1.0),
            _ => default.clamp(0.0, 1.0),
        }
    }
}

/// A usable `(trait, weight)` pair. `index` is the submission position, kept for audit logs.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TraitPair {
    pub index: usize,
    pub trait_name: String,
    pub weight: f64,
}

/// Numbers and numeric strings; everything else is "not numeric".
fn numeric(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|x| x.is_finite())
}

fn scalar_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse any accepted payload shape into answers, in submission order.
pub fn parse_answers(payload: &Value) -> Vec<Answer> {
    match payload {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_object().map(Answer::from_object))
            .collect(),
        Value::Object(obj) => match obj.get("answers") {
            // Envelope: unwrap exactly one level.
            Some(inner @ Value::Array(_)) => parse_answers(inner),
            Some(Value::Object(map)) => parse_mapping(map),
            Some(_) => Vec::new(),
            None => parse_mapping(obj),
        },
        _ => Vec::new(),
    }
}

fn parse_mapping(map: &Map<String, Value>) -> Vec<Answer> {
    map.iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(qid, v)| match v {
            Value::Object(rec) => {
                let mut a = Answer::from_object(rec);
                if a.question_id.is_none() {
                    a.question_id = Some(qid.clone());
                }
                a
            }
            other => Answer::question(qid.clone(), other.clone()),
        })
        .collect()
}

/// Reduce answers to usable pairs. Records without a trait are dropped.
pub fn normalize_answers(answers: &[Answer], cfg: &ScoringCfg) -> Vec<TraitPair> {
    answers
        .iter()
        .enumerate()
        .filter_map(|(index, a)| {
            let trait_name = a.trait_key()?;
            Some(TraitPair {
                index,
                trait_name,
                weight: a.weight_or(cfg.default_weight),
            })
        })
        .collect()
}

/// `parse_answers` followed by `normalize_answers`.
pub fn trait_pairs(payload: &Value, cfg: &ScoringCfg) -> Vec<TraitPair> {
    normalize_answers(&parse_answers(payload), cfg)
}
