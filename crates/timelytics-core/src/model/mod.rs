//! Voting ensemble regressor and its JSON artifact format.
//!
//! An artifact looks like:
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "name": "voting_model",
//!   "feature_order": ["purchase_day_of_week", "...", "distance"],
//!   "estimators": [
//!     { "kind": "random_forest", "weight": 1.0, "trees": [{ "nodes": [{ "value": 12.0 }] }] },
//!     { "kind": "gradient_boosting", "base_score": 12.0, "learning_rate": 0.1, "trees": [] },
//!     { "kind": "svr", "kernel": { "type": "rbf", "gamma": 0.1 },
//!       "support_vectors": [], "dual_coef": [], "intercept": 11.0 }
//!   ]
//! }
//! ```
//!
//! The ensemble prediction is the weighted mean of its estimators' predictions.

mod svr;
mod tree;

use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::artifact::ArtifactDecode;
use crate::features::{FEATURE_COUNT, FEATURE_ORDER, FEATURE_ORDER_VERSION, FeatureVector};

pub use svr::{Kernel, MAX_POLY_DEGREE, Scaler, Svr};
pub use tree::{Node, Tree};

/// Artifact format understood by this crate.
pub const FORMAT_VERSION: u32 = 1;

/// Errors raised while decoding or validating a model artifact.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Malformed model artifact: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported artifact format version {found} (expected {})", FORMAT_VERSION)]
    UnsupportedVersion { found: u32 },
    #[error(
        "Artifact feature order does not match feature order v{}: expected {expected:?}, got {actual:?}",
        FEATURE_ORDER_VERSION
    )]
    FeatureOrder {
        expected: Vec<String>,
        actual: Vec<String>,
    },
    #[error("Ensemble has no estimators")]
    Empty,
    #[error("Estimator {index} has invalid weight {weight}")]
    InvalidWeight { index: usize, weight: f64 },
    #[error("Estimator {index} is invalid: {details}")]
    InvalidEstimator { index: usize, details: String },
}

fn default_weight() -> f64 {
    1.0
}

fn default_learning_rate() -> f64 {
    1.0
}

/// A single member of the ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimator {
    /// Bagged trees, prediction is the mean of the leaves.
    RandomForest { trees: Vec<Tree> },
    /// Boosted trees, prediction is `base_score + learning_rate * sum(leaves)`.
    GradientBoosting {
        #[serde(default)]
        base_score: f64,
        #[serde(default = "default_learning_rate")]
        learning_rate: f64,
        trees: Vec<Tree>,
    },
    Svr(Svr),
}

impl Estimator {
    fn validate(&self) -> Result<(), String> {
        match self {
            Estimator::RandomForest { trees } => {
                if trees.is_empty() {
                    return Err("random forest has no trees".to_string());
                }
                validate_trees(trees)
            }
            Estimator::GradientBoosting {
                base_score,
                learning_rate,
                trees,
            } => {
                if !base_score.is_finite() || !learning_rate.is_finite() {
                    return Err("base_score and learning_rate must be finite".to_string());
                }
                validate_trees(trees)
            }
            Estimator::Svr(svr) => svr.validate(FEATURE_COUNT),
        }
    }

    pub fn predict(&self, row: &[f64; FEATURE_COUNT]) -> f64 {
        match self {
            Estimator::RandomForest { trees } => {
                trees.iter().map(|t| t.evaluate(row)).sum::<f64>() / trees.len() as f64
            }
            Estimator::GradientBoosting {
                base_score,
                learning_rate,
                trees,
            } => base_score + learning_rate * trees.iter().map(|t| t.evaluate(row)).sum::<f64>(),
            Estimator::Svr(svr) => svr.predict(row),
        }
    }
}

fn validate_trees(trees: &[Tree]) -> Result<(), String> {
    for (index, tree) in trees.iter().enumerate() {
        tree.validate(FEATURE_COUNT)
            .map_err(|e| format!("tree {index}: {e}"))?;
    }
    Ok(())
}

/// Ensemble member with its voting weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedEstimator {
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(flatten)]
    pub estimator: Estimator,
}

impl From<Estimator> for WeightedEstimator {
    fn from(estimator: Estimator) -> Self {
        Self {
            weight: default_weight(),
            estimator,
        }
    }
}

/// Voting ensemble regressor predicting delivery wait time in days.
///
/// Instances only exist once validated, so prediction never fails on structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleModel {
    format_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    feature_order: Vec<String>,
    estimators: Vec<WeightedEstimator>,
}

impl EnsembleModel {
    /// Build a model over [FEATURE_ORDER] from in-memory estimators.
    pub fn new(estimators: Vec<WeightedEstimator>) -> Result<Self, ModelError> {
        let model = Self {
            format_version: FORMAT_VERSION,
            name: None,
            feature_order: FEATURE_ORDER.iter().map(|s| s.to_string()).collect(),
            estimators,
        };
        model.validate()?;
        Ok(model)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Decode and validate an artifact from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ModelError> {
        let model: Self = serde_json::from_reader(std::io::BufReader::new(reader))?;
        model.validate()?;
        Ok(model)
    }

    /// Decode and validate an artifact from bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ModelError> {
        let model: Self = serde_json::from_slice(bytes)?;
        model.validate()?;
        Ok(model)
    }

    pub fn to_json_vec(&self) -> Result<Vec<u8>, ModelError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.format_version != FORMAT_VERSION {
            return Err(ModelError::UnsupportedVersion {
                found: self.format_version,
            });
        }
        if self.feature_order.iter().map(String::as_str).ne(FEATURE_ORDER) {
            return Err(ModelError::FeatureOrder {
                expected: FEATURE_ORDER.iter().map(|s| s.to_string()).collect(),
                actual: self.feature_order.clone(),
            });
        }
        if self.estimators.is_empty() {
            return Err(ModelError::Empty);
        }
        for (index, member) in self.estimators.iter().enumerate() {
            if !member.weight.is_finite() || member.weight <= 0.0 {
                return Err(ModelError::InvalidWeight {
                    index,
                    weight: member.weight,
                });
            }
            member
                .estimator
                .validate()
                .map_err(|details| ModelError::InvalidEstimator { index, details })?;
        }
        Ok(())
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn estimators(&self) -> &[WeightedEstimator] {
        &self.estimators
    }

    /// Predict a single row laid out in [FEATURE_ORDER].
    pub fn predict_row(&self, row: &[f64; FEATURE_COUNT]) -> f64 {
        let (sum, total_weight) = self
            .estimators
            .iter()
            .fold((0.0, 0.0), |(sum, total), member| {
                (
                    sum + member.weight * member.estimator.predict(row),
                    total + member.weight,
                )
            });
        sum / total_weight
    }

    pub fn predict(&self, features: &FeatureVector) -> f64 {
        self.predict_row(&features.to_row())
    }
}

impl ArtifactDecode for EnsembleModel {
    type Error = ModelError;

    fn decode<R: Read>(reader: R) -> Result<Self, Self::Error> {
        Self::from_reader(reader)
    }
}
