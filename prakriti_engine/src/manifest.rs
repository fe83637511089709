//! Feature manifest shipped next to a classifier artifact.
//!
//! ```json
//! {
//!   "features": ["vata", "pitta", "kapha", "sleep", {"name": "answer_count", "kind": "count"}],
//!   "categorical_features": {"q_skin": ["dry", "warm", "oily"]},
//!   "question_mapping": {"q7": "sleep", "q2": "q_skin"}
//! }
//! ```
//!
//! The order of `features` is the order of the classifier's input vector. This crate only
//! reads manifests; whatever trains the classifier writes them.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use crate::error::ModelError;

/// Count feature that always holds the number of answers carrying a trait.
pub const ANSWER_COUNT_FEATURE: &str = "answer_count";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    /// Mean answer weight; neutral 0.5.
    #[default]
    Graded,
    /// Number of matching answers; neutral 0.
    Count,
    /// 1-based level index of a string answer; neutral 0.
    Categorical,
}

impl FeatureKind {
    pub fn neutral(self) -> f64 {
        match self {
            FeatureKind::Graded => 0.5,
            FeatureKind::Count | FeatureKind::Categorical => 0.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FeatureSpec {
    pub name: String,
    pub kind: FeatureKind,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFeature {
    Name(String),
    Spec {
        name: String,
        #[serde(default)]
        kind: Option<FeatureKind>,
    },
}

#[derive(Deserialize)]
struct RawManifest {
    features: Vec<RawFeature>,
    #[serde(default)]
    categorical_features: HashMap<String, Vec<String>>,
    #[serde(default)]
    question_mapping: HashMap<String, String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureManifest {
    features: Vec<FeatureSpec>,
    /// Feature name -> ordered levels (lowercase).
    categorical: HashMap<String, Vec<String>>,
    /// Question id -> feature name.
    question_mapping: HashMap<String, String>,
}

impl FeatureManifest {
    /// Build a manifest of graded features.
    pub fn graded<I, S>(names: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let features = names
            .into_iter()
            .map(|n| FeatureSpec {
                name: n.into(),
                kind: FeatureKind::Graded,
            })
            .collect();
        Self::from_parts(features, HashMap::new(), HashMap::new())
    }

    pub fn from_parts(
        features: Vec<FeatureSpec>,
        categorical: HashMap<String, Vec<String>>,
        question_mapping: HashMap<String, String>,
    ) -> Result<Self, ModelError> {
        let m = Self {
            features: features
                .into_iter()
                .map(|f| FeatureSpec {
                    name: f.name.trim().to_ascii_lowercase(),
                    kind: f.kind,
                })
                .collect(),
            categorical: categorical
                .into_iter()
                .map(|(k, levels)| {
                    let levels = levels.iter().map(|l| l.trim().to_ascii_lowercase()).collect();
                    (k.trim().to_ascii_lowercase(), levels)
                })
                .collect(),
            question_mapping: question_mapping
                .into_iter()
                .map(|(q, f)| (q.trim().to_string(), f.trim().to_ascii_lowercase()))
                .collect(),
        };
        m.validate()?;
        Ok(m)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ModelError> {
        let raw: RawManifest = serde_json::from_str(s)?;
        let categorical = raw.categorical_features;
        let default_kind = |name: &str| {
            if categorical.keys().any(|k| k.trim().eq_ignore_ascii_case(name.trim())) {
                FeatureKind::Categorical
            } else {
                FeatureKind::Graded
            }
        };
        let features = raw
            .features
            .into_iter()
            .map(|f| match f {
                RawFeature::Name(name) => FeatureSpec {
                    kind: default_kind(&name),
                    name,
                },
                RawFeature::Spec { name, kind } => FeatureSpec {
                    kind: kind.unwrap_or_else(|| default_kind(&name)),
                    name,
                },
            })
            .collect();
        Self::from_parts(features, categorical, raw.question_mapping)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.features.is_empty() {
            return Err(ModelError::Manifest("no features declared".to_string()));
        }
        let mut seen = HashSet::new();
        for f in &self.features {
            if f.name.is_empty() {
                return Err(ModelError::Manifest("empty feature name".to_string()));
            }
            if !seen.insert(f.name.as_str()) {
                return Err(ModelError::Manifest(format!("duplicate feature `{}`", f.name)));
            }
            if f.kind == FeatureKind::Categorical && self.levels(&f.name).map_or(true, |l| l.is_empty()) {
                return Err(ModelError::Manifest(format!(
                    "categorical feature `{}` has no levels",
                    f.name
                )));
            }
        }
        // An empty level would match every answer text.
        for (name, levels) in &self.categorical {
            if levels.iter().any(String::is_empty) {
                return Err(ModelError::Manifest(format!("categorical feature `{name}` has an empty level")));
            }
        }
        Ok(())
    }

    pub fn features(&self) -> &[FeatureSpec] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn kind_of(&self, name: &str) -> Option<FeatureKind> {
        self.features.iter().find(|f| f.name == name).map(|f| f.kind)
    }

    pub fn levels(&self, feature: &str) -> Option<&[String]> {
        self.categorical.get(feature).map(Vec::as_slice)
    }

    /// Feature fed by a question id, if mapped.
    pub fn feature_for_question(&self, question_id: &str) -> Option<&str> {
        self.question_mapping.get(question_id.trim()).map(String::as_str)
    }
}
