//! Argmax accuracy
//!
//! The decision rule is a pure function of the score matrix: each row's
//! predicted class is the index of its maximum score, ties broken by the
//! lowest index.

use ndarray::{Array2, ArrayView1};

use crate::error::{FloranetError, Result};

/// Index of the maximum value; the first (lowest-index) maximum wins ties.
pub fn argmax_row(row: ArrayView1<f64>) -> usize {
    let mut best = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (i, &v) in row.iter().enumerate() {
        if v > best_value {
            best = i;
            best_value = v;
        }
    }
    best
}

/// Fraction of rows whose argmax over the scores matches the argmax over
/// the one-hot targets.
pub fn onehot_accuracy(scores: &Array2<f64>, targets: &Array2<f64>) -> Result<f64> {
    if scores.dim() != targets.dim() {
        return Err(FloranetError::ShapeMismatch {
            expected: format!("{} x {}", targets.nrows(), targets.ncols()),
            actual: format!("{} x {}", scores.nrows(), scores.ncols()),
        });
    }
    if scores.nrows() == 0 {
        return Err(FloranetError::InvalidParameter {
            name: "rows".to_string(),
            value: "0".to_string(),
            reason: "accuracy is undefined for an empty matrix".to_string(),
        });
    }

    let correct = scores
        .rows()
        .into_iter()
        .zip(targets.rows())
        .filter(|(predicted, truth)| argmax_row(*predicted) == argmax_row(*truth))
        .count();

    Ok(correct as f64 / scores.nrows() as f64)
}
