use std::sync::Arc;

use timelytics_core::FeatureVector;

use crate::cache::{LoadError, ModelCache};

#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error(transparent)]
    Model(Arc<LoadError>),
    #[error("model produced a non-finite prediction: {0}")]
    NonFinite(f64),
}

/// Turns a [FeatureVector] into a wait time in whole days.
#[derive(Clone)]
pub struct PredictionService {
    cache: Arc<ModelCache>,
}

impl PredictionService {
    pub fn new(cache: Arc<ModelCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<ModelCache> {
        &self.cache
    }

    /// Predict the order-to-delivery wait time.
    ///
    /// Input values are not range checked. Blocks while the model is provisioned on first use.
    pub fn predict(&self, features: &FeatureVector) -> Result<i64, PredictError> {
        let model = self.cache.get_model().map_err(PredictError::Model)?;
        let raw = model.predict(features);
        tracing::debug!(raw, "raw ensemble output");
        round_days(raw)
    }
}

/// Round half to even, the convention the model's reference outputs were produced with.
pub fn round_days(raw: f64) -> Result<i64, PredictError> {
    if !raw.is_finite() {
        return Err(PredictError::NonFinite(raw));
    }
    Ok(raw.round_ties_even() as i64)
}
