//! Classifier contract plus the two artifact kinds this crate can load.
//!
//! The classifier is a black box: training happens elsewhere and only the serialized result is
//! read here.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use prakriti_core::Dosha;
use serde::Deserialize;

use crate::error::ModelError;

/// What a classifier returns for one feature vector.
#[derive(Clone, Debug, PartialEq)]
pub enum ClassifierOutput {
    /// Per-class probabilities.
    Probabilities(Vec<(Dosha, f64)>),
    /// A hard label with no calibrated probability.
    Label(Dosha),
}

pub trait Classifier: Send + Sync + fmt::Debug {
    /// Short name for status reporting.
    fn kind(&self) -> &'static str;

    /// Input dimensionality.
    fn n_features(&self) -> usize;

    fn predict(&self, x: &[f64]) -> Result<ClassifierOutput, ModelError>;
}

fn check_input(x: &[f64], expected: usize) -> Result<(), ModelError> {
    if x.len() != expected {
        return Err(ModelError::Dimension {
            expected,
            got: x.len(),
        });
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::Classifier("non-finite feature value".to_string()));
    }
    Ok(())
}

fn check_classes(classes: &[Dosha]) -> Result<(), ModelError> {
    if classes.is_empty() {
        return Err(ModelError::Artifact("no classes".to_string()));
    }
    let unique: HashSet<_> = classes.iter().collect();
    if unique.len() != classes.len() {
        return Err(ModelError::Artifact("duplicate class".to_string()));
    }
    Ok(())
}

/// Rows must all be non-empty, finite, and the same width. Returns the width.
fn check_matrix(rows: &[Vec<f64>], what: &str) -> Result<usize, ModelError> {
    let width = rows.first().map(Vec::len).unwrap_or(0);
    if width == 0 {
        return Err(ModelError::Artifact(format!("{what}: empty rows")));
    }
    for (i, r) in rows.iter().enumerate() {
        if r.len() != width {
            return Err(ModelError::Artifact(format!(
                "{what}: row {i} has {} columns, expected {width}",
                r.len()
            )));
        }
        if r.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::Artifact(format!("{what}: row {i} is not finite")));
        }
    }
    Ok(width)
}

/// Multinomial logistic model: `softmax(W x + b)`.
#[derive(Clone, Debug, PartialEq)]
pub struct SoftmaxClassifier {
    classes: Vec<Dosha>,
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
    n_features: usize,
}

impl SoftmaxClassifier {
    pub fn new(classes: Vec<Dosha>, weights: Vec<Vec<f64>>, bias: Vec<f64>) -> Result<Self, ModelError> {
        check_classes(&classes)?;
        if weights.len() != classes.len() || bias.len() != classes.len() {
            return Err(ModelError::Artifact(format!(
                "softmax: {} classes but {} weight rows and {} biases",
                classes.len(),
                weights.len(),
                bias.len()
            )));
        }
        if bias.iter().any(|b| !b.is_finite()) {
            return Err(ModelError::Artifact("softmax: bias is not finite".to_string()));
        }
        let n_features = check_matrix(&weights, "softmax weights")?;
        Ok(Self {
            classes,
            weights,
            bias,
            n_features,
        })
    }
}

impl Classifier for SoftmaxClassifier {
    fn kind(&self) -> &'static str {
        "softmax"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, x: &[f64]) -> Result<ClassifierOutput, ModelError> {
        check_input(x, self.n_features)?;

        let logits: Vec<f64> = self
            .weights
            .iter()
            .zip(&self.bias)
            .map(|(row, b)| row.iter().zip(x).map(|(w, v)| w * v).sum::<f64>() + b)
            .collect();

        // Shift by the max logit so exp() cannot overflow.
        let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
        let z: f64 = exps.iter().sum();
        if !z.is_finite() || z <= 0.0 {
            return Err(ModelError::Classifier("softmax normalizer is degenerate".to_string()));
        }

        Ok(ClassifierOutput::Probabilities(
            self.classes.iter().copied().zip(exps.into_iter().map(|e| e / z)).collect(),
        ))
    }
}

/// Nearest-centroid model. Produces a label only.
#[derive(Clone, Debug, PartialEq)]
pub struct CentroidClassifier {
    classes: Vec<Dosha>,
    centroids: Vec<Vec<f64>>,
    n_features: usize,
}

impl CentroidClassifier {
    pub fn new(classes: Vec<Dosha>, centroids: Vec<Vec<f64>>) -> Result<Self, ModelError> {
        check_classes(&classes)?;
        if centroids.len() != classes.len() {
            return Err(ModelError::Artifact(format!(
                "centroid: {} classes but {} centroids",
                classes.len(),
                centroids.len()
            )));
        }
        let n_features = check_matrix(&centroids, "centroids")?;
        Ok(Self {
            classes,
            centroids,
            n_features,
        })
    }
}

impl Classifier for CentroidClassifier {
    fn kind(&self) -> &'static str {
        "centroid"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, x: &[f64]) -> Result<ClassifierOutput, ModelError> {
        check_input(x, self.n_features)?;

        let mut best: Option<(Dosha, f64)> = None;
        for (class, c) in self.classes.iter().zip(&self.centroids) {
            let d2: f64 = c.iter().zip(x).map(|(a, b)| (a - b) * (a - b)).sum();
            // Strict `<` keeps the first-listed class on ties.
            if best.map_or(true, |(_, bd)| d2 < bd) {
                best = Some((*class, d2));
            }
        }
        best.map(|(class, _)| ClassifierOutput::Label(class))
            .ok_or_else(|| ModelError::Classifier("no centroids".to_string()))
    }
}

/// On-disk classifier artifact (`prakriti_model.json`).
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    Softmax {
        classes: Vec<Dosha>,
        weights: Vec<Vec<f64>>,
        bias: Vec<f64>,
    },
    Centroid {
        classes: Vec<Dosha>,
        centroids: Vec<Vec<f64>>,
    },
}

impl ModelArtifact {
    pub fn from_json_str(s: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Validate shapes and build the classifier.
    pub fn into_classifier(self) -> Result<Box<dyn Classifier>, ModelError> {
        Ok(match self {
            ModelArtifact::Softmax { classes, weights, bias } => {
                Box::new(SoftmaxClassifier::new(classes, weights, bias)?)
            }
            ModelArtifact::Centroid { classes, centroids } => {
                Box::new(CentroidClassifier::new(classes, centroids)?)
            }
        })
    }
}
