//! Integration tests: REST serving

use axum::body::Body;
use axum::http::{Request, StatusCode};
use cardioml::artifacts::{ArtifactStore, ModelLoader};
use cardioml::models::{LogisticRegression, ModelKind, TrainedModel};
use cardioml::preprocessing::Preprocessor;
use cardioml::server::{create_router, AppState, ServerConfig};
use ndarray::Array1;
use polars::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn test_config(models_dir: &str) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        models_dir: models_dir.to_string(),
        model_kind: "logistic_regression".to_string(),
    }
}

fn degraded_app() -> axum::Router {
    let config = test_config("/nonexistent/models");
    let state = Arc::new(AppState::new(config, None));
    create_router(state)
}

/// Writes artifacts into `dir` and returns a router with a bound loader.
fn bound_app(dir: &std::path::Path) -> axum::Router {
    let columns: Vec<Column> = cardioml::data::FEATURE_NAMES
        .iter()
        .map(|&name| Column::new(name.into(), &[1.0, 2.0, 3.0, 4.0]))
        .collect();
    let features = DataFrame::new(columns).unwrap();
    let mut preprocessor = Preprocessor::new();
    preprocessor.fit(&features).unwrap();

    // Constant-probability model: P(class 1) = 0.7 for any input
    let model = TrainedModel::LogisticRegression(LogisticRegression::from_parameters(
        Array1::zeros(13),
        (0.7f64 / 0.3).ln(),
    ));

    let store = ArtifactStore::new(dir);
    store
        .save_model(&model, ModelKind::LogisticRegression, "20240101_101010")
        .unwrap();
    store
        .save_preprocessor(&preprocessor, "20240101_101010")
        .unwrap();

    let mut loader = ModelLoader::new(ArtifactStore::new(dir), "logistic_regression");
    loader.resolve().unwrap();

    let config = test_config(&dir.display().to_string());
    let state = Arc::new(AppState::new(config, Some(Arc::new(loader))));
    create_router(state)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 64)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn valid_record() -> Value {
    json!({
        "age": 63, "sex": 1, "cp": 1, "trestbps": 145, "chol": 233,
        "fbs": 1, "restecg": 2, "thalach": 150, "exang": 0,
        "oldpeak": 2.3, "slope": 3, "ca": 0, "thal": 6
    })
}

#[tokio::test]
async fn test_health_degraded_without_model() {
    let response = degraded_app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["model_loaded"], false);
}

#[tokio::test]
async fn test_predict_without_model_is_503() {
    let response = degraded_app()
        .oneshot(post_json("/predict", valid_record()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_validation_rejects_out_of_range_age() {
    let mut record = valid_record();
    record["age"] = json!(500);

    let response = degraded_app()
        .oneshot(post_json("/predict", record))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert!(json["message"].as_str().unwrap().contains("age"));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let response = degraded_app()
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_predict_with_bound_model() {
    let dir = tempfile::tempdir().unwrap();
    let response = bound_app(dir.path())
        .oneshot(post_json("/predict", valid_record()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["prediction"], 1);
    assert_eq!(json["prediction_label"], "Disease Present");
    assert!((json["probability"].as_f64().unwrap() - 0.7).abs() < 1e-9);
    assert!((json["confidence"].as_f64().unwrap() - 0.7).abs() < 1e-9);
}

#[tokio::test]
async fn test_predict_with_partial_record() {
    let dir = tempfile::tempdir().unwrap();
    let response = bound_app(dir.path())
        .oneshot(post_json("/predict", json!({"age": 63, "sex": 1})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_batch_predict() {
    let dir = tempfile::tempdir().unwrap();
    let response = bound_app(dir.path())
        .oneshot(post_json(
            "/predict/batch",
            json!([valid_record(), valid_record(), valid_record()]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["count"], 3);
    assert_eq!(json["predictions"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_empty_batch_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let response = bound_app(dir.path())
        .oneshot(post_json("/predict/batch", json!([])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_model_info_reports_bound_paths() {
    let dir = tempfile::tempdir().unwrap();
    let response = bound_app(dir.path())
        .oneshot(
            Request::builder()
                .uri("/model/info")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["kind"], "logistic_regression");
    assert!(json["model_path"]
        .as_str()
        .unwrap()
        .contains("logistic_regression_20240101_101010.json"));
}

#[tokio::test]
async fn test_healthy_status_with_bound_model() {
    let dir = tempfile::tempdir().unwrap();
    let response = bound_app(dir.path())
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["model_loaded"], true);
}
