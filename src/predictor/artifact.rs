//! Frozen-artifact predictor
//!
//! Consumes models trained by an external batch job and frozen to disk as
//! JSON: a feature-name list, standard-scaler parameters and linear
//! coefficients per model. The outcome model is a binary logistic regression
//! over {Down, Up}; the size model is a linear regression clamped at zero.
//! This file format is the crate's consumption contract only; how the
//! trainer persists its own weights is out of scope.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::traits::Predictor;
use crate::common::errors::{EngineError, Result};
use crate::common::types::{Prediction, SizePrediction};
use crate::features::FeatureRecord;

/// File name of the outcome model inside the models directory
pub const OUTCOME_MODEL_FILE: &str = "outcome_model.json";
/// File name of the size model inside the models directory
pub const SIZE_MODEL_FILE: &str = "size_model.json";

/// Standard-scaler parameters, one entry per feature
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerSpec {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// One frozen linear model: named features, scaler, weights
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModelSpec {
    /// Feature names in training order; resolved against
    /// [`FeatureRecord::value`] at prediction time
    pub feature_names: Vec<String>,
    pub scaler: ScalerSpec,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearModelSpec {
    fn validate(&self, label: &str) -> Result<()> {
        let n = self.feature_names.len();
        if n == 0 {
            return Err(EngineError::Configuration(format!(
                "{label}: empty feature list"
            )));
        }
        if self.scaler.mean.len() != n || self.scaler.scale.len() != n {
            return Err(EngineError::Configuration(format!(
                "{label}: scaler length {}/{} does not match {} features",
                self.scaler.mean.len(),
                self.scaler.scale.len(),
                n
            )));
        }
        if self.coefficients.len() != n {
            return Err(EngineError::Configuration(format!(
                "{label}: {} coefficients for {} features",
                self.coefficients.len(),
                n
            )));
        }
        Ok(())
    }

    /// Standardize the named features and apply the linear form.
    ///
    /// Features the record does not know resolve to 0 before scaling;
    /// zero-variance scaler entries contribute 0.
    fn linear_score(&self, features: &FeatureRecord) -> f64 {
        let mut score = self.intercept;
        for (i, name) in self.feature_names.iter().enumerate() {
            let raw = features.value(name).unwrap_or(0.0);
            let scale = self.scaler.scale[i];
            if scale > 0.0 {
                score += self.coefficients[i] * (raw - self.scaler.mean[i]) / scale;
            }
        }
        score
    }
}

/// Predictor backed by frozen model artifacts on disk
#[derive(Debug, Clone)]
pub struct ArtifactPredictor {
    outcome: LinearModelSpec,
    size: LinearModelSpec,
}

impl ArtifactPredictor {
    /// Load both model artifacts from `models_dir`.
    ///
    /// Missing or inconsistent artifacts are a [`EngineError::Configuration`]
    /// error, fatal at startup, before any request is served.
    pub fn load(models_dir: &Path) -> Result<Self> {
        let outcome = load_spec(&models_dir.join(OUTCOME_MODEL_FILE))?;
        let size = load_spec(&models_dir.join(SIZE_MODEL_FILE))?;
        let predictor = Self::from_specs(outcome, size)?;
        info!(
            models_dir = %models_dir.display(),
            outcome_features = predictor.outcome.feature_names.len(),
            size_features = predictor.size.feature_names.len(),
            "loaded predictor artifacts"
        );
        Ok(predictor)
    }

    /// Build a predictor from already-parsed specs (used by tests)
    pub fn from_specs(outcome: LinearModelSpec, size: LinearModelSpec) -> Result<Self> {
        outcome.validate("outcome model")?;
        size.validate("size model")?;
        Ok(Self { outcome, size })
    }
}

impl Predictor for ArtifactPredictor {
    fn predict_outcome(&self, features: &FeatureRecord) -> Result<Prediction> {
        let score = self.outcome.linear_score(features);
        Ok(Prediction::from_up_probability(sigmoid(score)))
    }

    fn predict_size(&self, features: &FeatureRecord) -> Result<SizePrediction> {
        let predicted = self.size.linear_score(features);
        Ok(SizePrediction {
            recommended_usdc_size: predicted.max(0.0),
        })
    }
}

fn load_spec(path: &Path) -> Result<LinearModelSpec> {
    if !path.exists() {
        return Err(EngineError::Configuration(format!(
            "model artifact not found: {}",
            path.display()
        )));
    }
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|e| {
        EngineError::Configuration(format!("invalid model artifact {}: {e}", path.display()))
    })
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
