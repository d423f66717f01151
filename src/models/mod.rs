//! Classification models
//!
//! Two hand-rolled classifiers share a common [`TrainedModel`] wrapper so the
//! training orchestrator and the serving layer can stay model-agnostic:
//! logistic regression fitted by gradient descent and a bootstrap random
//! forest over Gini decision trees. Both persist to JSON through serde.

mod cross_validation;
mod decision_tree;
mod logistic;
mod metrics;
mod random_forest;

pub use cross_validation::{stratified_split_indices, CVResults, FoldSplit, StratifiedKFold};
pub use decision_tree::{DecisionTree, MaxFeatures, TreeNode};
pub use logistic::LogisticRegression;
pub use metrics::{
    accuracy_score, confusion_matrix, precision_score, recall_score, roc_auc_score, ModelMetrics,
};
pub use random_forest::RandomForest;

use crate::error::{CardioError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// The model families the pipeline trains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    LogisticRegression,
    RandomForest,
}

impl ModelKind {
    pub const ALL: [ModelKind; 2] = [ModelKind::LogisticRegression, ModelKind::RandomForest];

    /// Snake-case identifier used in artifact file names
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::LogisticRegression => "logistic_regression",
            ModelKind::RandomForest => "random_forest",
        }
    }

    /// Human-readable name used in reports and the training summary
    pub fn display_name(&self) -> &'static str {
        match self {
            ModelKind::LogisticRegression => "Logistic Regression",
            ModelKind::RandomForest => "Random Forest",
        }
    }
}

impl FromStr for ModelKind {
    type Err = CardioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace([' ', '-'], "_").as_str() {
            "logistic_regression" | "logreg" => Ok(ModelKind::LogisticRegression),
            "random_forest" | "rf" => Ok(ModelKind::RandomForest),
            other => Err(CardioError::ValidationError(format!(
                "unknown model kind '{other}' (expected logistic_regression or random_forest)"
            ))),
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fitted classifier of either family, ready for inference or persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "model_type")]
pub enum TrainedModel {
    LogisticRegression(LogisticRegression),
    RandomForest(RandomForest),
}

impl TrainedModel {
    pub fn kind(&self) -> ModelKind {
        match self {
            TrainedModel::LogisticRegression(_) => ModelKind::LogisticRegression,
            TrainedModel::RandomForest(_) => ModelKind::RandomForest,
        }
    }

    /// Class labels at the 0.5 threshold
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            TrainedModel::LogisticRegression(m) => m.predict(x),
            TrainedModel::RandomForest(m) => m.predict(x),
        }
    }

    /// Probability of the positive class per row
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            TrainedModel::LogisticRegression(m) => m.predict_proba(x),
            TrainedModel::RandomForest(m) => m.predict_proba(x),
        }
    }

    /// Per-class probability matrix with columns [P(class 0), P(class 1)]
    pub fn predict_proba_matrix(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        match self {
            TrainedModel::LogisticRegression(m) => m.predict_proba_matrix(x),
            TrainedModel::RandomForest(m) => m.predict_proba_matrix(x),
        }
    }

    /// Persist the model to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a model from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let model: Self = serde_json::from_str(&json)?;
        Ok(model)
    }
}

/// Fit a fresh model of the requested kind with the pipeline's fixed
/// hyperparameters.
pub fn train_model(kind: ModelKind, x: &Array2<f64>, y: &Array1<f64>) -> Result<TrainedModel> {
    match kind {
        ModelKind::LogisticRegression => {
            let mut model = LogisticRegression::new()
                .with_alpha(0.01)
                .with_max_iter(1000)
                .with_learning_rate(0.1);
            model.fit(x, y)?;
            Ok(TrainedModel::LogisticRegression(model))
        }
        ModelKind::RandomForest => {
            let mut model = RandomForest::new().with_n_estimators(100).with_seed(42);
            model.fit(x, y)?;
            Ok(TrainedModel::RandomForest(model))
        }
    }
}
