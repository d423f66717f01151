//! Decision tree classifier using Gini impurity

use crate::error::{CardioError, Result};
use ndarray::{Array1, Array2};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// How many features each split considers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// All features at every split
    All,
    /// floor(sqrt(n_features)), the forest default
    Sqrt,
}

/// A node in the decision tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node storing the majority class and the class-1 fraction of the
    /// training rows that reached it
    Leaf { prediction: f64, class1_fraction: f64 },
    /// Internal split: rows with feature value <= threshold go left
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// Binary decision tree classifier.
///
/// Splits minimize weighted Gini impurity. The feature subset sampled at each
/// split is driven by a seeded generator, so a fixed seed gives a fixed tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    /// Column count the tree was fitted on
    pub n_features: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub max_features: MaxFeatures,
    pub seed: u64,
    pub is_fitted: bool,
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            n_features: 0,
            max_depth: 16,
            min_samples_split: 2,
            max_features: MaxFeatures::All,
            seed: 42,
            is_fitted: false,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Fit the tree on labels in {0, 1}
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

        let indices: Vec<usize> = (0..x.nrows()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.n_features = x.ncols();
        self.root = Some(self.build_node(x, y, &indices, 0, &mut rng));
        self.is_fitted = true;
        Ok(self)
    }

    fn check_width(&self, x: &Array2<f64>) -> Result<()> {
        if x.ncols() != self.n_features {
            return Err(CardioError::ShapeError {
                expected: format!("{} feature columns", self.n_features),
                actual: format!("{} feature columns", x.ncols()),
            });
        }
        Ok(())
    }

    fn n_split_features(&self, n_features: usize) -> usize {
        match self.max_features {
            MaxFeatures::All => n_features,
            MaxFeatures::Sqrt => ((n_features as f64).sqrt().floor() as usize).max(1),
        }
    }

    fn class1_fraction(y: &Array1<f64>, indices: &[usize]) -> f64 {
        let positives = indices.iter().filter(|&&i| y[i] >= 0.5).count();
        positives as f64 / indices.len() as f64
    }

    fn gini(fraction: f64) -> f64 {
        2.0 * fraction * (1.0 - fraction)
    }

    fn make_leaf(y: &Array1<f64>, indices: &[usize]) -> TreeNode {
        let fraction = Self::class1_fraction(y, indices);
        TreeNode::Leaf {
            prediction: if fraction >= 0.5 { 1.0 } else { 0.0 },
            class1_fraction: fraction,
        }
    }

    fn build_node(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let fraction = Self::class1_fraction(y, indices);
        let pure = fraction == 0.0 || fraction == 1.0;
        if pure || depth >= self.max_depth || indices.len() < self.min_samples_split {
            return Self::make_leaf(y, indices);
        }

        let mut candidate_features: Vec<usize> = (0..x.ncols()).collect();
        candidate_features.shuffle(rng);
        candidate_features.truncate(self.n_split_features(x.ncols()));

        let parent_gini = Self::gini(fraction);
        let mut best: Option<(usize, f64, f64)> = None; // (feature, threshold, gain)

        for &feature in &candidate_features {
            let mut values: Vec<f64> = indices.iter().map(|&i| x[[i, feature]]).collect();
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            values.dedup();

            for pair in values.windows(2) {
                let threshold = (pair[0] + pair[1]) / 2.0;

                let (left, right): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| x[[i, feature]] <= threshold);
                if left.is_empty() || right.is_empty() {
                    continue;
                }

                let n = indices.len() as f64;
                let left_gini = Self::gini(Self::class1_fraction(y, &left));
                let right_gini = Self::gini(Self::class1_fraction(y, &right));
                let weighted =
                    (left.len() as f64 / n) * left_gini + (right.len() as f64 / n) * right_gini;
                let gain = parent_gini - weighted;

                if gain > best.map_or(1e-12, |(_, _, g)| g) {
                    best = Some((feature, threshold, gain));
                }
            }
        }

        let Some((feature, threshold, _)) = best else {
            return Self::make_leaf(y, indices);
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, feature]] <= threshold);

        TreeNode::Split {
            feature,
            threshold,
            left: Box::new(self.build_node(x, y, &left_idx, depth + 1, rng)),
            right: Box::new(self.build_node(x, y, &right_idx, depth + 1, rng)),
        }
    }

    fn traverse<'a>(node: &'a TreeNode, row: ndarray::ArrayView1<f64>) -> &'a TreeNode {
        match node {
            TreeNode::Leaf { .. } => node,
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if row[*feature] <= *threshold {
                    Self::traverse(left, row)
                } else {
                    Self::traverse(right, row)
                }
            }
        }
    }

    /// Predicted class label per row
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(CardioError::NotFitted)?;
        self.check_width(x)?;
        let out: Vec<f64> = x
            .rows()
            .into_iter()
            .map(|row| match Self::traverse(root, row) {
                TreeNode::Leaf { prediction, .. } => *prediction,
                TreeNode::Split { .. } => unreachable!("traverse always ends at a leaf"),
            })
            .collect();
        Ok(Array1::from(out))
    }

    /// Class-1 fraction of the leaf each row lands in
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(CardioError::NotFitted)?;
        self.check_width(x)?;
        let out: Vec<f64> = x
            .rows()
            .into_iter()
            .map(|row| match Self::traverse(root, row) {
                TreeNode::Leaf { class1_fraction, .. } => *class1_fraction,
                TreeNode::Split { .. } => unreachable!("traverse always ends at a leaf"),
            })
            .collect();
        Ok(Array1::from(out))
    }
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}
