//! Request handlers

use super::{error::ServerError, state::AppState};
use crate::artifacts::SinglePrediction;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// One patient record as received over the API. Absent fields are allowed
/// and take the preprocessor's imputed values downstream.
#[derive(Debug, Clone, Deserialize)]
pub struct PatientRecord {
    pub age: Option<f64>,
    pub sex: Option<f64>,
    pub cp: Option<f64>,
    pub trestbps: Option<f64>,
    pub chol: Option<f64>,
    pub fbs: Option<f64>,
    pub restecg: Option<f64>,
    pub thalach: Option<f64>,
    pub exang: Option<f64>,
    pub oldpeak: Option<f64>,
    pub slope: Option<f64>,
    pub ca: Option<f64>,
    pub thal: Option<f64>,
}

fn check_range(name: &str, value: Option<f64>, lo: f64, hi: f64) -> Result<(), ServerError> {
    if let Some(v) = value {
        if !(lo..=hi).contains(&v) {
            return Err(ServerError::BadRequest(format!(
                "{name} must be between {lo} and {hi}, got {v}"
            )));
        }
    }
    Ok(())
}

impl PatientRecord {
    /// Per-field clinical bounds; only present fields are checked.
    fn validate(&self) -> Result<(), ServerError> {
        check_range("age", self.age, 0.0, 120.0)?;
        check_range("sex", self.sex, 0.0, 1.0)?;
        check_range("cp", self.cp, 1.0, 4.0)?;
        check_range("trestbps", self.trestbps, 0.0, 300.0)?;
        check_range("chol", self.chol, 0.0, 700.0)?;
        check_range("fbs", self.fbs, 0.0, 1.0)?;
        check_range("restecg", self.restecg, 0.0, 2.0)?;
        check_range("thalach", self.thalach, 0.0, 300.0)?;
        check_range("exang", self.exang, 0.0, 1.0)?;
        check_range("oldpeak", self.oldpeak, 0.0, 10.0)?;
        check_range("slope", self.slope, 1.0, 3.0)?;
        check_range("ca", self.ca, 0.0, 3.0)?;
        check_range("thal", self.thal, 3.0, 7.0)?;
        Ok(())
    }

    fn to_fields(&self) -> HashMap<String, f64> {
        let pairs = [
            ("age", self.age),
            ("sex", self.sex),
            ("cp", self.cp),
            ("trestbps", self.trestbps),
            ("chol", self.chol),
            ("fbs", self.fbs),
            ("restecg", self.restecg),
            ("thalach", self.thalach),
            ("exang", self.exang),
            ("oldpeak", self.oldpeak),
            ("slope", self.slope),
            ("ca", self.ca),
            ("thal", self.thal),
        ];
        pairs
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| (name.to_string(), v)))
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct BatchPredictionResponse {
    pub predictions: Vec<SinglePrediction>,
    pub count: usize,
}

/// GET / - service description
pub async fn root() -> Json<Value> {
    Json(json!({
        "service": "heart disease prediction API",
        "endpoints": ["/health", "/predict", "/predict/batch", "/model/info"],
    }))
}

/// GET /health - reports whether a model is bound
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let loaded = state.model_loaded();
    Json(json!({
        "status": if loaded { "healthy" } else { "degraded" },
        "model_loaded": loaded,
        "model_kind": state.config.model_kind,
        "uptime_secs": chrono::Utc::now()
            .signed_duration_since(state.started_at)
            .num_seconds(),
    }))
}

fn loader_of(state: &AppState) -> Result<&crate::artifacts::ModelLoader, ServerError> {
    state.loader.as_deref().ok_or_else(|| {
        ServerError::ModelUnavailable("train a model and restart the server".to_string())
    })
}

/// POST /predict - single-record inference
pub async fn predict(
    State(state): State<Arc<AppState>>,
    Json(record): Json<PatientRecord>,
) -> Result<Json<SinglePrediction>, ServerError> {
    record.validate()?;
    let loader = loader_of(&state)?;
    let result = loader.predict_single(&record.to_fields())?;
    info!(
        prediction = result.prediction,
        probability = result.probability,
        "prediction served"
    );
    Ok(Json(result))
}

/// POST /predict/batch - inference over an array of records
pub async fn predict_batch(
    State(state): State<Arc<AppState>>,
    Json(records): Json<Vec<PatientRecord>>,
) -> Result<Json<BatchPredictionResponse>, ServerError> {
    if records.is_empty() {
        return Err(ServerError::BadRequest(
            "batch must contain at least one record".to_string(),
        ));
    }

    let loader = loader_of(&state)?;
    let predictions = records
        .iter()
        .map(|record| {
            record.validate()?;
            Ok(loader.predict_single(&record.to_fields())?)
        })
        .collect::<Result<Vec<_>, ServerError>>()?;

    let count = predictions.len();
    info!(count, "batch prediction served");
    Ok(Json(BatchPredictionResponse { predictions, count }))
}

/// GET /model/info - bound artifact paths and metrics
pub async fn model_info(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ServerError> {
    let loader = loader_of(&state)?;
    Ok(Json(json!({
        "kind": loader.kind(),
        "model_path": loader.model_path(),
        "preprocessor_path": loader.preprocessor_path(),
        "metrics": loader.metrics(),
    })))
}
