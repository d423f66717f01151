//! Classification metrics

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Evaluation results for a single trained model, as persisted in the
/// training summary artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub roc_auc: f64,
    pub cv_mean: f64,
    pub cv_std: f64,
    /// Rows are actual class, columns are predicted class:
    /// [[tn, fp], [fn, tp]]
    pub confusion_matrix: [[u64; 2]; 2],
}

/// Fraction of predictions matching the true label
pub fn accuracy_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| (*t >= &0.5) == (*p >= &0.5))
        .count();
    correct as f64 / y_true.len() as f64
}

/// tp / (tp + fp). Returns 0.0 when nothing was predicted positive.
pub fn precision_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let [[_, fp], [_, tp]] = confusion_matrix(y_true, y_pred);
    if tp + fp == 0 {
        0.0
    } else {
        tp as f64 / (tp + fp) as f64
    }
}

/// tp / (tp + fn). Returns 0.0 when no positives exist.
pub fn recall_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let [[_, _], [fn_, tp]] = confusion_matrix(y_true, y_pred);
    if tp + fn_ == 0 {
        0.0
    } else {
        tp as f64 / (tp + fn_) as f64
    }
}

/// 2x2 confusion matrix: rows are actual class, columns predicted class
pub fn confusion_matrix(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> [[u64; 2]; 2] {
    let mut matrix = [[0u64; 2]; 2];
    for (t, p) in y_true.iter().zip(y_pred.iter()) {
        let actual = usize::from(*t >= 0.5);
        let predicted = usize::from(*p >= 0.5);
        matrix[actual][predicted] += 1;
    }
    matrix
}

/// Area under the ROC curve via the rank-sum (Mann-Whitney) statistic.
///
/// Tied scores receive their average rank. Returns 0.5 when either class is
/// absent, since the curve is undefined there.
pub fn roc_auc_score(y_true: &Array1<f64>, y_score: &Array1<f64>) -> f64 {
    let n = y_true.len();
    let n_pos = y_true.iter().filter(|&&t| t >= 0.5).count();
    let n_neg = n - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return 0.5;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        y_score[a]
            .partial_cmp(&y_score[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Average ranks over tied score groups (1-based ranks)
    let mut ranks = vec![0.0f64; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && y_score[order[j + 1]] == y_score[order[i]] {
            j += 1;
        }
        let avg_rank = (i + j + 2) as f64 / 2.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg_rank;
        }
        i = j + 1;
    }

    let rank_sum_pos: f64 = y_true
        .iter()
        .zip(ranks.iter())
        .filter(|(t, _)| **t >= 0.5)
        .map(|(_, r)| *r)
        .sum();

    let u = rank_sum_pos - (n_pos * (n_pos + 1)) as f64 / 2.0;
    u / (n_pos * n_neg) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_accuracy_perfect_and_zero() {
        let y = array![0.0, 1.0, 1.0, 0.0];
        assert_eq!(accuracy_score(&y, &y), 1.0);

        let flipped = array![1.0, 0.0, 0.0, 1.0];
        assert_eq!(accuracy_score(&y, &flipped), 0.0);
    }

    #[test]
    fn test_confusion_matrix_layout() {
        let y_true = array![0.0, 0.0, 1.0, 1.0, 1.0];
        let y_pred = array![0.0, 1.0, 1.0, 1.0, 0.0];
        let m = confusion_matrix(&y_true, &y_pred);
        assert_eq!(m, [[1, 1], [1, 2]]);
    }

    #[test]
    fn test_precision_recall() {
        let y_true = array![0.0, 0.0, 1.0, 1.0, 1.0];
        let y_pred = array![0.0, 1.0, 1.0, 1.0, 0.0];
        // tp=2, fp=1, fn=1
        assert!((precision_score(&y_true, &y_pred) - 2.0 / 3.0).abs() < 1e-12);
        assert!((recall_score(&y_true, &y_pred) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_precision_no_positive_predictions() {
        let y_true = array![1.0, 1.0];
        let y_pred = array![0.0, 0.0];
        assert_eq!(precision_score(&y_true, &y_pred), 0.0);
    }

    #[test]
    fn test_roc_auc_perfect_separation() {
        let y_true = array![0.0, 0.0, 1.0, 1.0];
        let y_score = array![0.1, 0.2, 0.8, 0.9];
        assert!((roc_auc_score(&y_true, &y_score) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_roc_auc_inverted() {
        let y_true = array![1.0, 1.0, 0.0, 0.0];
        let y_score = array![0.1, 0.2, 0.8, 0.9];
        assert!(roc_auc_score(&y_true, &y_score).abs() < 1e-12);
    }

    #[test]
    fn test_roc_auc_ties_use_average_rank() {
        // All scores identical: AUC collapses to chance
        let y_true = array![0.0, 1.0, 0.0, 1.0];
        let y_score = array![0.5, 0.5, 0.5, 0.5];
        assert!((roc_auc_score(&y_true, &y_score) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_roc_auc_single_class_is_half() {
        let y_true = array![1.0, 1.0, 1.0];
        let y_score = array![0.2, 0.5, 0.9];
        assert_eq!(roc_auc_score(&y_true, &y_score), 0.5);
    }
}
