use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use timelytics_runtime::PredictError;
use tokio::task::JoinError;

use crate::form::FormError;

/// Request failures, mapped onto HTTP statuses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input for {0}")]
    Invalid(#[from] FormError),
    #[error(transparent)]
    Predict(#[from] PredictError),
    #[error("prediction task failed: {0}")]
    Task(#[from] JoinError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Predict(PredictError::Model(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Predict(PredictError::NonFinite(_)) | AppError::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Text shown in the output section of the page.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Predict(PredictError::Model(err)) => err.user_message(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.user_message() }))).into_response()
    }
}
