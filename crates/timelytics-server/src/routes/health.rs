//! Health check endpoint

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use timelytics_registry::ArtifactDiagnostics;

use crate::state::SharedState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub artifact: Option<ArtifactDiagnostics>,
    pub uptime_seconds: u64,
    pub version: String,
}

/// GET /health - Health check endpoint
pub async fn health_check(State(state): State<SharedState>) -> Json<HealthResponse> {
    let cache = state.cache().clone();
    let artifact = match tokio::task::spawn_blocking(move || cache.provisioner().diagnostics()).await
    {
        Ok(Ok(diagnostics)) => Some(diagnostics),
        Ok(Err(err)) => {
            tracing::warn!("could not inspect the model artifact: {err}");
            None
        }
        Err(err) => {
            tracing::warn!("artifact inspection task failed: {err}");
            None
        }
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        model_loaded: state.cache().is_loaded(),
        artifact,
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
