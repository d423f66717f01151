//! Stratified splitting and k-fold cross-validation

use crate::error::{CardioError, Result};
use ndarray::Array1;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Aggregated scores from a cross-validation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CVResults {
    pub scores: Vec<f64>,
    pub mean: f64,
    pub std: f64,
}

impl CVResults {
    pub fn from_scores(scores: Vec<f64>) -> Self {
        let n = scores.len() as f64;
        let mean = if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / n
        };
        let std = if scores.len() < 2 {
            0.0
        } else {
            let var = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (n - 1.0);
            var.sqrt()
        };
        Self { scores, mean, std }
    }
}

/// One fold: indices into the original rows
#[derive(Debug, Clone)]
pub struct FoldSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// Stratified train/test split preserving the class balance of `y`.
///
/// Rows of each class are shuffled with a seeded generator and the first
/// `test_size` fraction of each class goes to the test set. Returns
/// `(train_indices, test_indices)`.
pub fn stratified_split_indices(
    y: &Array1<f64>,
    test_size: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(0.0..1.0).contains(&test_size) || test_size == 0.0 {
        return Err(CardioError::ValidationError(format!(
            "test_size must be in (0, 1), got {test_size}"
        )));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for class in [0.0, 1.0] {
        let mut class_indices: Vec<usize> = y
            .iter()
            .enumerate()
            .filter(|(_, v)| (**v >= 0.5) == (class >= 0.5))
            .map(|(i, _)| i)
            .collect();
        class_indices.shuffle(&mut rng);

        let n_test = ((class_indices.len() as f64) * test_size).round() as usize;
        test.extend_from_slice(&class_indices[..n_test.min(class_indices.len())]);
        train.extend_from_slice(&class_indices[n_test.min(class_indices.len())..]);
    }

    if train.is_empty() || test.is_empty() {
        return Err(CardioError::TrainingError(
            "stratified split produced an empty partition".to_string(),
        ));
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok((train, test))
}

/// Stratified k-fold splitter.
///
/// Each class is shuffled independently with a seeded generator and dealt
/// round-robin across folds, so every fold keeps roughly the overall class
/// ratio.
#[derive(Debug, Clone)]
pub struct StratifiedKFold {
    pub n_splits: usize,
    pub seed: u64,
}

impl StratifiedKFold {
    pub fn new(n_splits: usize, seed: u64) -> Self {
        Self { n_splits, seed }
    }

    pub fn split(&self, y: &Array1<f64>) -> Result<Vec<FoldSplit>> {
        if self.n_splits < 2 {
            return Err(CardioError::ValidationError(format!(
                "n_splits must be at least 2, got {}",
                self.n_splits
            )));
        }

        let minority = y
            .iter()
            .filter(|&&v| v >= 0.5)
            .count()
            .min(y.iter().filter(|&&v| v < 0.5).count());
        if minority < self.n_splits {
            return Err(CardioError::TrainingError(format!(
                "cannot make {} stratified folds with only {} samples in the smallest class",
                self.n_splits, minority
            )));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut fold_members: Vec<Vec<usize>> = vec![Vec::new(); self.n_splits];

        for class in [0.0, 1.0] {
            let mut class_indices: Vec<usize> = y
                .iter()
                .enumerate()
                .filter(|(_, v)| (**v >= 0.5) == (class >= 0.5))
                .map(|(i, _)| i)
                .collect();
            class_indices.shuffle(&mut rng);

            for (pos, idx) in class_indices.into_iter().enumerate() {
                fold_members[pos % self.n_splits].push(idx);
            }
        }

        let splits = (0..self.n_splits)
            .map(|fold| {
                let mut test_indices = fold_members[fold].clone();
                test_indices.sort_unstable();
                let mut train_indices: Vec<usize> = fold_members
                    .iter()
                    .enumerate()
                    .filter(|(f, _)| *f != fold)
                    .flat_map(|(_, members)| members.iter().copied())
                    .collect();
                train_indices.sort_unstable();
                FoldSplit {
                    train_indices,
                    test_indices,
                }
            })
            .collect();

        Ok(splits)
    }
}
