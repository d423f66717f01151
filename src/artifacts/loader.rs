//! Model resolution and inference binding

use super::store::{timestamp_token, ArtifactStore, PREPROCESSOR_PREFIX, SUMMARY_PREFIX};
use crate::data::{feature_names, FEATURE_NAMES};
use crate::error::{CardioError, Result};
use crate::models::{ModelMetrics, TrainedModel};
use crate::preprocessing::Preprocessor;
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Inference input accepted by a bound loader
pub enum PredictInput {
    /// A named feature table
    Frame(DataFrame),
    /// A raw numeric matrix. With exactly 13 columns it is interpreted
    /// against the fixed schema; any other width is passed through unnamed.
    Matrix(Array2<f64>),
    /// A single record as field name to value
    Record(HashMap<String, f64>),
}

/// Result of a predict call: labels or probabilities, never both
#[derive(Debug, Clone)]
pub enum Prediction {
    Labels(Array1<f64>),
    /// Per-class probabilities, columns [P(class 0), P(class 1)]
    Probabilities(Array2<f64>),
}

/// Response shape for single-record inference
#[derive(Debug, Clone, Serialize)]
pub struct SinglePrediction {
    pub prediction: i64,
    pub prediction_label: String,
    /// Probability mass assigned to class 1
    pub probability: f64,
    /// Maximum probability across classes
    pub confidence: f64,
}

/// Everything a bound loader holds: immutable after binding.
#[derive(Debug)]
struct Binding {
    model: TrainedModel,
    preprocessor: Preprocessor,
    metrics: Option<ModelMetrics>,
    model_path: PathBuf,
    preprocessor_path: PathBuf,
}

/// Resolves "the current model" of a requested kind from an artifact store
/// and serves inference against it.
///
/// Starts unbound; `resolve` scans the store and binds a model, preprocessor
/// and (best effort) metrics triple. Once bound the loader is read-only;
/// picking up newer artifacts means constructing and resolving a new loader.
#[derive(Debug)]
pub struct ModelLoader {
    store: ArtifactStore,
    kind: String,
    binding: Option<Binding>,
}

impl ModelLoader {
    /// Create an unbound loader for a model kind. The kind string is
    /// normalized: lowercased, spaces and dashes become underscores.
    pub fn new(store: ArtifactStore, kind: &str) -> Self {
        Self {
            store,
            kind: normalize_kind(kind),
            binding: None,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// Path of the bound model artifact, if bound
    pub fn model_path(&self) -> Option<&PathBuf> {
        self.binding.as_ref().map(|b| &b.model_path)
    }

    /// Path of the bound preprocessor artifact, if bound
    pub fn preprocessor_path(&self) -> Option<&PathBuf> {
        self.binding.as_ref().map(|b| &b.preprocessor_path)
    }

    /// Metrics attached at resolve time, if any were found
    pub fn metrics(&self) -> Option<&ModelMetrics> {
        self.binding.as_ref().and_then(|b| b.metrics.as_ref())
    }

    fn bound(&self) -> Result<&Binding> {
        self.binding.as_ref().ok_or_else(|| {
            CardioError::InferenceError("model not loaded; call resolve first".to_string())
        })
    }

    /// Scan the store and bind the freshest artifact of the requested kind.
    ///
    /// Model selection is by filesystem modification time with a
    /// lexicographic path tie-break. The preprocessor is paired by the
    /// model's trailing timestamp token when a stem contains it, otherwise
    /// the most recently modified preprocessor wins. Metrics attachment is
    /// best effort and never fails the resolve.
    pub fn resolve(&mut self) -> Result<&mut Self> {
        let candidates = self.store.list(&self.kind)?;
        let model_path = self
            .store
            .require(ArtifactStore::newest_by_mtime(candidates), &self.kind)?;

        let preprocessors = self.store.list(PREPROCESSOR_PREFIX)?;
        if preprocessors.is_empty() {
            return Err(CardioError::ArtifactNotFound {
                pattern: format!("{PREPROCESSOR_PREFIX}_*"),
                dir: self.store.dir().to_path_buf(),
            });
        }

        let preprocessor_path = match timestamp_token(&model_path) {
            Some(token) => {
                let matched = preprocessors.iter().find(|p| {
                    p.file_stem()
                        .and_then(|s| s.to_str())
                        .is_some_and(|stem| stem.contains(&token))
                });
                match matched {
                    Some(p) => p.clone(),
                    None => {
                        warn!(
                            kind = %self.kind,
                            token = %token,
                            "no preprocessor matches the model timestamp; falling back to newest"
                        );
                        self.store
                            .require(ArtifactStore::newest_by_mtime(preprocessors), PREPROCESSOR_PREFIX)?
                    }
                }
            }
            None => self
                .store
                .require(ArtifactStore::newest_by_mtime(preprocessors), PREPROCESSOR_PREFIX)?,
        };

        let model = TrainedModel::load(&model_path)?;
        let preprocessor = Preprocessor::load(&preprocessor_path)?;
        let metrics = self.attach_metrics();

        debug!(
            model = %model_path.display(),
            preprocessor = %preprocessor_path.display(),
            has_metrics = metrics.is_some(),
            "model resolved"
        );

        self.binding = Some(Binding {
            model,
            preprocessor,
            metrics,
            model_path,
            preprocessor_path,
        });
        Ok(self)
    }

    /// Look up this kind's metrics in the newest training summary. Any
    /// failure along the way degrades to `None`.
    fn attach_metrics(&self) -> Option<ModelMetrics> {
        let summary_path = self.store.latest(SUMMARY_PREFIX).ok().flatten()?;
        let summary = match ArtifactStore::load_summary(&summary_path) {
            Ok(s) => s,
            Err(e) => {
                warn!(path = %summary_path.display(), error = %e, "unreadable training summary");
                return None;
            }
        };
        summary
            .models
            .iter()
            .find(|(name, _)| normalize_kind(name).contains(&self.kind))
            .map(|(_, metrics)| metrics.clone())
    }

    fn input_to_frame(input: PredictInput) -> Result<DataFrame> {
        match input {
            PredictInput::Frame(df) => Ok(df),
            PredictInput::Matrix(x) => {
                let names: Vec<String> = if x.ncols() == FEATURE_NAMES.len() {
                    feature_names()
                } else {
                    (0..x.ncols()).map(|i| format!("column_{i}")).collect()
                };
                let columns: Vec<Column> = names
                    .iter()
                    .enumerate()
                    .map(|(i, name)| {
                        let values: Vec<f64> = x.column(i).to_vec();
                        Column::new(name.as_str().into(), values)
                    })
                    .collect();
                Ok(DataFrame::new(columns)?)
            }
            PredictInput::Record(fields) => record_to_frame(&fields),
        }
    }

    fn frame_to_matrix(df: &DataFrame) -> Result<Array2<f64>> {
        let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
        crate::data::columns_to_array2(df, &names)
    }

    /// Run inference. Requires a bound loader.
    ///
    /// The bound preprocessor transforms the input first, then the model's
    /// native predict or predict-probability call runs on the result.
    pub fn predict(&self, input: PredictInput, want_probabilities: bool) -> Result<Prediction> {
        let binding = self.bound()?;

        let frame = Self::input_to_frame(input)?;
        let transformed = binding.preprocessor.transform(&frame)?;
        let x = Self::frame_to_matrix(&transformed)?;

        if want_probabilities {
            Ok(Prediction::Probabilities(
                binding.model.predict_proba_matrix(&x)?,
            ))
        } else {
            Ok(Prediction::Labels(binding.model.predict(&x)?))
        }
    }

    /// Predict one record given a partial field map. Absent fields become
    /// nulls and take the preprocessor's imputed values.
    pub fn predict_single(&self, fields: &HashMap<String, f64>) -> Result<SinglePrediction> {
        let binding = self.bound()?;

        let frame = record_to_frame(fields)?;
        let transformed = binding.preprocessor.transform(&frame)?;
        let x = Self::frame_to_matrix(&transformed)?;

        let labels = binding.model.predict(&x)?;
        let proba = binding.model.predict_proba_matrix(&x)?;

        let prediction = labels[0] as i64;
        let p0 = proba[[0, 0]];
        let p1 = proba[[0, 1]];

        Ok(SinglePrediction {
            prediction,
            prediction_label: if prediction == 1 {
                "Disease Present".to_string()
            } else {
                "No Disease".to_string()
            },
            probability: p1,
            confidence: p0.max(p1),
        })
    }
}

fn normalize_kind(kind: &str) -> String {
    kind.to_lowercase().replace([' ', '-'], "_")
}

/// Build a one-row table over the fixed schema. Fields absent from the map
/// become nulls.
fn record_to_frame(fields: &HashMap<String, f64>) -> Result<DataFrame> {
    let columns: Vec<Column> = FEATURE_NAMES
        .iter()
        .map(|&name| Column::new(name.into(), &[fields.get(name).copied()]))
        .collect();
    Ok(DataFrame::new(columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_kind() {
        assert_eq!(normalize_kind("Random Forest"), "random_forest");
        assert_eq!(normalize_kind("logistic-regression"), "logistic_regression");
    }

    #[test]
    fn test_record_to_frame_missing_fields_are_null() {
        let mut fields = HashMap::new();
        fields.insert("age".to_string(), 63.0);

        let frame = record_to_frame(&fields).unwrap();
        assert_eq!(frame.height(), 1);
        assert_eq!(frame.width(), 13);
        assert_eq!(frame.column("age").unwrap().null_count(), 0);
        assert_eq!(frame.column("chol").unwrap().null_count(), 1);
    }

    #[test]
    fn test_unbound_predict_fails() {
        let store = ArtifactStore::new("/nonexistent");
        let loader = ModelLoader::new(store, "random_forest");
        let result = loader.predict_single(&HashMap::new());
        assert!(matches!(result, Err(CardioError::InferenceError(_))));
    }

    #[test]
    fn test_resolve_missing_artifacts_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let mut loader = ModelLoader::new(store, "random_forest");
        assert!(matches!(
            loader.resolve(),
            Err(CardioError::ArtifactNotFound { .. })
        ));
    }
}
