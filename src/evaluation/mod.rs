//! Seeded splitting, argmax accuracy, and cross-validation

mod accuracy;
mod cross_validation;
mod split;

pub use accuracy::{argmax_row, onehot_accuracy};
pub use cross_validation::{
    evaluate_holdout, ConvergencePolicy, CrossValidationRunner, CvReport, FoldOutcome,
    HoldoutReport,
};
pub use split::{train_test_split, CvSplit, CvStrategy, HoldoutSplit, Splitter};
