//! Training orchestrator
//!
//! One sequential run: load the processed table, split, fit the
//! preprocessor on the training partition, fit both classifiers, evaluate,
//! and persist every artifact under a single run timestamp.

use crate::artifacts::{ArtifactStore, TrainingSummary};
use crate::data::{self, prepare_features_target};
use crate::error::{CardioError, Result};
use crate::models::{
    accuracy_score, confusion_matrix, precision_score, recall_score, roc_auc_score,
    stratified_split_indices, train_model, CVResults, ModelKind, ModelMetrics, StratifiedKFold,
};
use crate::preprocessing::Preprocessor;
use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Fixed split and CV settings; changing these breaks run-to-run
/// reproducibility claims.
pub const TEST_FRACTION: f64 = 0.2;
pub const SPLIT_SEED: u64 = 42;
pub const CV_FOLDS: usize = 5;

/// Outcome of one training run
#[derive(Debug)]
pub struct TrainingReport {
    pub timestamp: String,
    pub summary: TrainingSummary,
    pub best_model: ModelKind,
    pub artifact_paths: Vec<PathBuf>,
}

fn take_rows(df: &DataFrame, indices: &[usize]) -> Result<DataFrame> {
    let idx = IdxCa::from_vec(
        "idx".into(),
        indices.iter().map(|&i| i as IdxSize).collect(),
    );
    Ok(df.take(&idx)?)
}

fn take_targets(y: &Array1<f64>, indices: &[usize]) -> Array1<f64> {
    Array1::from(indices.iter().map(|&i| y[i]).collect::<Vec<f64>>())
}

fn evaluate(
    kind: ModelKind,
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    x_test: &Array2<f64>,
    y_test: &Array1<f64>,
) -> Result<(crate::models::TrainedModel, ModelMetrics)> {
    let model = train_model(kind, x_train, y_train)?;

    let y_pred = model.predict(x_test)?;
    let y_score = model.predict_proba(x_test)?;
    let cv = cross_validate(kind, x_train, y_train)?;

    let metrics = ModelMetrics {
        accuracy: accuracy_score(y_test, &y_pred),
        precision: precision_score(y_test, &y_pred),
        recall: recall_score(y_test, &y_pred),
        roc_auc: roc_auc_score(y_test, &y_score),
        cv_mean: cv.mean,
        cv_std: cv.std,
        confusion_matrix: confusion_matrix(y_test, &y_pred),
    };
    Ok((model, metrics))
}

/// Stratified k-fold ROC-AUC on the training partition only
fn cross_validate(kind: ModelKind, x: &Array2<f64>, y: &Array1<f64>) -> Result<CVResults> {
    let folds = StratifiedKFold::new(CV_FOLDS, SPLIT_SEED).split(y)?;

    let scores = folds
        .iter()
        .map(|fold| {
            let x_fit = x.select(Axis(0), &fold.train_indices);
            let y_fit = take_targets(y, &fold.train_indices);
            let x_val = x.select(Axis(0), &fold.test_indices);
            let y_val = take_targets(y, &fold.test_indices);

            let model = train_model(kind, &x_fit, &y_fit)?;
            let y_score = model.predict_proba(&x_val)?;
            Ok(roc_auc_score(&y_val, &y_score))
        })
        .collect::<Result<Vec<f64>>>()?;

    Ok(CVResults::from_scores(scores))
}

/// Run the full training pipeline against a processed CSV and persist all
/// artifacts under `models_dir`.
pub fn run_training(data_path: &Path, models_dir: &Path) -> Result<TrainingReport> {
    let df = data::load_csv(data_path).map_err(|e| match e {
        CardioError::DataFileNotFound { path, .. } => CardioError::DataFileNotFound {
            path,
            hint: "run the preprocess step first to produce the processed table".to_string(),
        },
        other => other,
    })?;
    info!(rows = df.height(), cols = df.width(), "loaded processed table");

    let (features, y) = prepare_features_target(&df)?;
    let (train_idx, test_idx) = stratified_split_indices(&y, TEST_FRACTION, SPLIT_SEED)?;
    info!(
        train = train_idx.len(),
        test = test_idx.len(),
        "stratified split"
    );

    let features_train = take_rows(&features, &train_idx)?;
    let features_test = take_rows(&features, &test_idx)?;
    let y_train = take_targets(&y, &train_idx);
    let y_test = take_targets(&y, &test_idx);

    // Preprocessor learns from the training partition only
    let mut preprocessor = Preprocessor::new();
    preprocessor.fit(&features_train)?;
    let scaled_train = preprocessor.transform(&features_train)?;
    let scaled_test = preprocessor.transform(&features_test)?;

    let columns: Vec<String> = preprocessor.columns().to_vec();
    let x_train = data::columns_to_array2(&scaled_train, &columns)?;
    let x_test = data::columns_to_array2(&scaled_test, &columns)?;

    let timestamp = ArtifactStore::run_timestamp();
    let store = ArtifactStore::new(models_dir);
    let mut artifact_paths = Vec::new();
    let mut models = BTreeMap::new();
    let mut best: Option<(ModelKind, f64)> = None;

    for kind in ModelKind::ALL {
        info!(model = %kind, "training");
        let (model, metrics) = evaluate(kind, &x_train, &y_train, &x_test, &y_test)?;
        info!(
            model = %kind,
            accuracy = metrics.accuracy,
            roc_auc = metrics.roc_auc,
            cv_mean = metrics.cv_mean,
            "evaluated"
        );

        if best.map_or(true, |(_, auc)| metrics.roc_auc > auc) {
            best = Some((kind, metrics.roc_auc));
        }

        artifact_paths.push(store.save_model(&model, kind, &timestamp)?);
        models.insert(kind.display_name().to_string(), metrics);
    }

    artifact_paths.push(store.save_preprocessor(&preprocessor, &timestamp)?);

    let summary = TrainingSummary {
        timestamp: timestamp.clone(),
        models,
    };
    artifact_paths.push(store.save_summary(&summary, &timestamp)?);

    // Informational only: serving always binds a configured kind
    let (best_model, best_auc) = best.ok_or_else(|| {
        CardioError::TrainingError("no model produced a score".to_string())
    })?;
    info!(best = %best_model, roc_auc = best_auc, "training run complete");

    Ok(TrainingReport {
        timestamp,
        summary,
        best_model,
        artifact_paths,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_take_rows_selects_indices() {
        let df = DataFrame::new(vec![
            Series::new("a".into(), &[10.0, 20.0, 30.0, 40.0]).into(),
        ])
        .unwrap();
        let picked = take_rows(&df, &[0, 2]).unwrap();
        let col = picked.column("a").unwrap().f64().unwrap();
        assert_eq!(col.get(0), Some(10.0));
        assert_eq!(col.get(1), Some(30.0));
    }

    #[test]
    fn test_cross_validate_produces_fold_scores() {
        // 30 rows per class, cleanly separable in one dimension
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..30 {
            rows.push([i as f64 * 0.1, 1.0]);
            labels.push(0.0);
            rows.push([10.0 + i as f64 * 0.1, 1.0]);
            labels.push(1.0);
        }
        let x = Array2::from_shape_fn((rows.len(), 2), |(r, c)| rows[r][c]);
        let y = Array1::from(labels);

        let cv = cross_validate(ModelKind::LogisticRegression, &x, &y).unwrap();
        assert_eq!(cv.scores.len(), CV_FOLDS);
        assert!(cv.mean > 0.9);
    }

    #[test]
    fn test_missing_data_file_mentions_preprocess() {
        let err = run_training(
            Path::new("/nonexistent/processed.csv"),
            Path::new("/tmp/unused_models"),
        )
        .unwrap_err();
        match err {
            CardioError::DataFileNotFound { hint, .. } => {
                assert!(hint.contains("preprocess"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_take_targets() {
        let y = array![0.0, 1.0, 0.0, 1.0];
        assert_eq!(take_targets(&y, &[1, 3]), array![1.0, 1.0]);
    }
}
