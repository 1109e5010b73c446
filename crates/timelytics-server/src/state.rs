//! Shared application state.

use std::sync::Arc;
use std::time::Instant;

use timelytics_core::FeatureVector;
use timelytics_runtime::{ModelCache, PredictionService};

use crate::error::AppError;

pub struct AppState {
    service: PredictionService,
    started_at: Instant,
}

impl AppState {
    pub fn new(cache: Arc<ModelCache>) -> Self {
        Self {
            service: PredictionService::new(cache),
            started_at: Instant::now(),
        }
    }

    pub fn cache(&self) -> &Arc<ModelCache> {
        self.service.cache()
    }

    /// Run a prediction on the blocking pool; the first one may download the artifact.
    pub async fn predict(&self, features: FeatureVector) -> Result<i64, AppError> {
        let service = self.service.clone();
        let days = tokio::task::spawn_blocking(move || service.predict(&features)).await??;
        Ok(days)
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

pub type SharedState = Arc<AppState>;
