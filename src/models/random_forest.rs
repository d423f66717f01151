//! Random forest classifier

use super::decision_tree::{DecisionTree, MaxFeatures};
use crate::error::{CardioError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Ensemble of Gini decision trees trained on bootstrap resamples.
///
/// Each tree gets its own deterministic seed derived from `seed + tree index`,
/// so the forest as a whole is reproducible. Training is parallelized across
/// trees with rayon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    /// Column count the forest was fitted on
    pub n_features: usize,
    pub n_estimators: usize,
    pub max_depth: usize,
    pub seed: u64,
    pub is_fitted: bool,
}

impl RandomForest {
    pub fn new() -> Self {
        Self {
            trees: Vec::new(),
            n_features: 0,
            n_estimators: 100,
            max_depth: 16,
            seed: 42,
            is_fitted: false,
        }
    }

    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn bootstrap_sample(
        x: &Array2<f64>,
        y: &Array1<f64>,
        rng: &mut ChaCha8Rng,
    ) -> (Array2<f64>, Array1<f64>) {
        let n = x.nrows();
        let indices: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
        let xb = x.select(Axis(0), &indices);
        let yb = Array1::from(indices.iter().map(|&i| y[i]).collect::<Vec<f64>>());
        (xb, yb)
    }

    /// Fit the ensemble on labels in {0, 1}
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        if x.nrows() != y.len() {
            return Err(CardioError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }
        if x.nrows() == 0 {
            return Err(CardioError::TrainingError("empty training set".to_string()));
        }

        self.n_features = x.ncols();
        let base_seed = self.seed;
        let max_depth = self.max_depth;

        self.trees = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let tree_seed = base_seed.wrapping_add(tree_idx as u64);
                let mut rng = ChaCha8Rng::seed_from_u64(tree_seed);
                let (xb, yb) = Self::bootstrap_sample(x, y, &mut rng);

                let mut tree = DecisionTree::new()
                    .with_max_depth(max_depth)
                    .with_max_features(MaxFeatures::Sqrt)
                    .with_seed(tree_seed);
                tree.fit(&xb, &yb)?;
                Ok(tree)
            })
            .collect::<Result<Vec<_>>>()?;

        self.is_fitted = true;
        Ok(self)
    }

    /// Fraction of trees voting class 1, per row
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(CardioError::NotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(CardioError::ShapeError {
                expected: format!("{} feature columns", self.n_features),
                actual: format!("{} feature columns", x.ncols()),
            });
        }

        let votes = self
            .trees
            .par_iter()
            .map(|tree| tree.predict(x))
            .collect::<Result<Vec<_>>>()?;

        let n_trees = votes.len() as f64;
        let mut proba = Array1::zeros(x.nrows());
        for tree_votes in &votes {
            proba = proba + tree_votes;
        }
        Ok(proba / n_trees)
    }

    /// Full per-class probability matrix: column 0 is P(class 0), column 1 is P(class 1)
    pub fn predict_proba_matrix(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let p1 = self.predict_proba(x)?;
        let mut proba = Array2::zeros((p1.len(), 2));
        for (i, &p) in p1.iter().enumerate() {
            proba[[i, 0]] = 1.0 - p;
            proba[[i, 1]] = p;
        }
        Ok(proba)
    }

    /// Majority-vote class labels
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new()
    }
}
