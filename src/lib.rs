//! floranet - feed-forward classification of tabular measurements
//!
//! Trains a small feed-forward network on a labeled table of numeric
//! measurements and estimates generalization accuracy on a held-out split
//! and via seeded k-fold cross-validation.
//!
//! # Modules
//!
//! - [`data`] - Table loading and data quality reporting
//! - [`preprocessing`] - Feature standardization and one-hot target encoding
//! - [`model`] - The trainer/predictor contract and the shipped MLP
//! - [`evaluation`] - Seeded splitting, argmax accuracy, cross-validation
//! - [`cli`] - Command-line interface

pub mod error;

pub mod data;
pub mod preprocessing;
pub mod model;
pub mod evaluation;

pub mod cli;

pub use error::{FloranetError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{FloranetError, Result};

    pub use crate::data::{CsvLoader, QualityReport};

    pub use crate::preprocessing::{
        ClassLayout, EncodedTable, Preprocessor, StandardScaler, TargetEncoder,
    };

    pub use crate::model::{MlpConfig, MlpTrainer, OutputActivation, Predictor, Trainer};

    pub use crate::evaluation::{
        evaluate_holdout, onehot_accuracy, train_test_split, ConvergencePolicy,
        CrossValidationRunner, CvReport, CvSplit, CvStrategy, FoldOutcome, HoldoutReport,
        HoldoutSplit, Splitter,
    };
}
