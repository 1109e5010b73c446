//! Timelytics web server
//!
//! Serves the prediction form, a small JSON API, and a health check on top of a shared
//! [ModelCache](timelytics_runtime::ModelCache).

pub mod error;
pub mod form;
pub mod page;
pub mod routes;
pub mod sample;
pub mod state;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::state::SharedState;

pub fn app(state: SharedState) -> Router {
    Router::new()
        .route(
            "/",
            get(routes::form::index).post(routes::form::submit),
        )
        .route("/api/predict", post(routes::api::predict))
        .route("/api/sample", get(routes::api::sample))
        .route("/health", get(routes::health::health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::path::Path;
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use timelytics_registry::{Provisioner, RegistryError, RemoteStore};
    use timelytics_runtime::ModelCache;
    use tower::ServiceExt;

    use crate::state::AppState;

    const REFERENCE_MODEL: &[u8] =
        include_bytes!("../../timelytics-runtime/testdata/reference_model.json");

    struct OfflineStore;

    impl RemoteStore for OfflineStore {
        fn fetch(&self, remote_id: &str) -> Result<Box<dyn Read + Send>, RegistryError> {
            Err(RegistryError::DownloadFailed {
                id: remote_id.to_string(),
                details: "network unreachable".to_string(),
            })
        }
    }

    fn test_app(dir: &Path, with_model: bool) -> (Router, SharedState) {
        let path = dir.join("voting_model.json");
        if with_model {
            std::fs::write(&path, REFERENCE_MODEL).unwrap();
        }
        let cache = ModelCache::new(Provisioner::new(Arc::new(OfflineStore), path, "reference"));
        let state = Arc::new(AppState::new(Arc::new(cache)));
        (app(state.clone()), state)
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn form_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    const DEFAULT_FORM: &str = "purchase_day_of_week=3&purchase_month=1&purchase_year=2018\
        &product_size_cm3=9328&product_weight_g=1800&customer_geolocation_state=10\
        &seller_geolocation_state=20&distance=475.35";

    #[tokio::test]
    async fn index_renders_without_loading_the_model() {
        let dir = tempfile::tempdir().unwrap();
        let (app, state) = test_app(dir.path(), false);

        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("Predict Wait Time!"));
        assert_eq!(state.cache().load_count(), 0);
    }

    #[tokio::test]
    async fn form_submit_shows_the_prediction() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = test_app(dir.path(), true);

        let response = app.oneshot(form_request(DEFAULT_FORM)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("Predicted Wait Time: <strong>14 days</strong>"));
    }

    #[tokio::test]
    async fn form_submit_without_model_reports_and_keeps_serving() {
        let dir = tempfile::tempdir().unwrap();
        let (app, state) = test_app(dir.path(), false);

        let response = app.clone().oneshot(form_request(DEFAULT_FORM)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let html = body_string(response).await;
        assert!(html.contains("Model file is missing!"));
        assert!(!html.contains("Predicted Wait Time"));

        std::fs::write(dir.path().join("voting_model.json"), REFERENCE_MODEL).unwrap();
        let response = app.oneshot(form_request(DEFAULT_FORM)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.cache().load_count(), 2);
    }

    #[tokio::test]
    async fn out_of_range_form_is_rejected_before_the_model() {
        let dir = tempfile::tempdir().unwrap();
        let (app, state) = test_app(dir.path(), true);
        let body = DEFAULT_FORM.replace("purchase_day_of_week=3", "purchase_day_of_week=7");

        let response = app.oneshot(form_request(&body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let html = body_string(response).await;
        assert!(html.contains("Purchased Day of the Week: must be between 0 and 6"));
        assert!(html.contains("value=\"7\""));
        assert_eq!(state.cache().load_count(), 0);
    }

    fn json_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/predict")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn api_predicts_sample_rows() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = test_app(dir.path(), true);
        let features = crate::sample::SAMPLE_ROWS[1];

        let response = app
            .oneshot(json_request(serde_json::to_value(features).unwrap()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body, serde_json::json!({ "wait_time_days": 12 }));
    }

    #[tokio::test]
    async fn api_rejects_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = test_app(dir.path(), true);

        let response = app
            .clone()
            .oneshot(json_request(serde_json::json!({ "purchase_month": 1 })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let mut features = serde_json::to_value(timelytics_core::FeatureVector::default()).unwrap();
        features["purchase_month"] = serde_json::json!(0);
        let response = app.oneshot(json_request(features)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert!(body["error"].as_str().unwrap().contains("Purchased Month"));
    }

    #[tokio::test]
    async fn api_reports_unavailable_model() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = test_app(dir.path(), false);

        let features = serde_json::to_value(timelytics_core::FeatureVector::default()).unwrap();
        let response = app.oneshot(json_request(features)).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert!(body["error"].as_str().unwrap().starts_with("Model file is missing!"));
    }

    #[tokio::test]
    async fn sample_endpoint_lists_three_rows() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = test_app(dir.path(), false);

        let response = app
            .oneshot(Request::get("/api/sample").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["columns"].as_array().unwrap().len(), 8);
        assert_eq!(body["rows"].as_array().unwrap().len(), 3);
        assert_eq!(body["rows"][2]["distance"], serde_json::json!(4.915));
    }

    #[tokio::test]
    async fn health_reports_artifact_and_readiness() {
        let dir = tempfile::tempdir().unwrap();
        let (app, state) = test_app(dir.path(), true);

        let response = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["model_loaded"], false);
        assert_eq!(body["artifact"]["present"], true);
        assert_eq!(body["artifact"]["sha256"].as_str().unwrap().len(), 64);

        state.cache().get_model().unwrap();
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["model_loaded"], true);
    }
}
