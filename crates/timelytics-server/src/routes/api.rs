//! JSON endpoints

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::Serialize;
use timelytics_core::FeatureVector;

use crate::error::AppError;
use crate::form::{FormError, check_ranges};
use crate::sample::SampleTable;
use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub wait_time_days: i64,
}

/// POST /api/predict - Predict from a JSON feature vector
pub async fn predict(
    State(state): State<SharedState>,
    payload: Result<Json<FeatureVector>, JsonRejection>,
) -> Result<Json<PredictResponse>, AppError> {
    let Json(features) = payload.map_err(|rejection| FormError {
        label: "request body",
        message: rejection.body_text(),
    })?;
    check_ranges(&features)?;

    let wait_time_days = state.predict(features).await?;
    Ok(Json(PredictResponse { wait_time_days }))
}

/// GET /api/sample - The sample dataset
pub async fn sample() -> Json<SampleTable> {
    Json(SampleTable::new())
}
