//! Cross-validation orchestration
//!
//! Runs the train → predict → score contract once per fold and aggregates
//! only after every fold has been visited. Folds share no mutable state:
//! each owns its training subset, scaler statistics, predictor, and
//! accuracy, so the loop can optionally run folds in parallel.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::evaluation::accuracy::onehot_accuracy;
use crate::evaluation::split::{train_test_split, CvSplit, CvStrategy, Splitter};
use crate::model::Trainer;
use crate::preprocessing::{EncodedTable, StandardScaler};

/// How a trainer's failure to converge is handled at the fold level.
///
/// Either way the outcome is explicit: a skipped fold is recorded as
/// not-completed and excluded from the mean, never counted as 0% accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvergencePolicy {
    /// Record the fold as not-completed and continue with the rest
    SkipFold,
    /// Fail the whole run, carrying the fold index
    Abort,
}

impl Default for ConvergencePolicy {
    fn default() -> Self {
        Self::SkipFold
    }
}

/// Result of a single fold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoldOutcome {
    pub fold_idx: usize,
    pub n_train: usize,
    pub n_eval: usize,
    /// `None` when the fold was skipped under [`ConvergencePolicy::SkipFold`]
    pub accuracy: Option<f64>,
}

/// Aggregated cross-validation result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvReport {
    pub outcomes: Vec<FoldOutcome>,
    /// Mean accuracy over completed folds; `None` when no fold completed
    pub mean_accuracy: Option<f64>,
    pub completed: usize,
    pub requested: usize,
}

impl CvReport {
    /// Aggregate per-fold outcomes
    pub fn from_outcomes(outcomes: Vec<FoldOutcome>, requested: usize) -> Self {
        let scores: Vec<f64> = outcomes.iter().filter_map(|o| o.accuracy).collect();
        let completed = scores.len();
        let mean_accuracy = if completed > 0 {
            Some(scores.iter().sum::<f64>() / completed as f64)
        } else {
            None
        };

        Self {
            outcomes,
            mean_accuracy,
            completed,
            requested,
        }
    }

    /// Human-readable summary
    pub fn summary(&self) -> String {
        match self.mean_accuracy {
            Some(mean) => format!(
                "cross-validation: {}/{} folds completed, mean accuracy {:.2}%",
                self.completed,
                self.requested,
                mean * 100.0
            ),
            None => format!(
                "cross-validation: 0/{} folds completed, no accuracy available",
                self.requested
            ),
        }
    }
}

/// Result of a single train/test split evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldoutReport {
    pub accuracy: f64,
    pub n_train: usize,
    pub n_test: usize,
}

impl HoldoutReport {
    /// Human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "held-out accuracy: {:.2}% ({} train / {} test rows)",
            self.accuracy * 100.0,
            self.n_train,
            self.n_test
        )
    }
}

/// Orchestrates splitting, per-fold training, and accuracy aggregation
pub struct CrossValidationRunner<'a> {
    trainer: &'a dyn Trainer,
    strategy: CvStrategy,
    random_state: Option<u64>,
    policy: ConvergencePolicy,
    parallel: bool,
}

impl<'a> CrossValidationRunner<'a> {
    pub fn new(trainer: &'a dyn Trainer) -> Self {
        Self {
            trainer,
            strategy: CvStrategy::default(),
            random_state: None,
            policy: ConvergencePolicy::default(),
            parallel: false,
        }
    }

    pub fn with_strategy(mut self, strategy: CvStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Seed for reproducible fold assignment
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    pub fn with_policy(mut self, policy: ConvergencePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run folds on the rayon pool instead of sequentially
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Run the full cross-validation over an encoded table
    pub fn run(&self, table: &EncodedTable) -> Result<CvReport> {
        let mut splitter = Splitter::new(self.strategy.clone());
        if let Some(seed) = self.random_state {
            splitter = splitter.with_random_state(seed);
        }
        let splits = splitter.split(table.n_rows(), Some(&table.class_indices))?;
        let requested = splits.len();

        let mut outcomes = Vec::with_capacity(requested);

        if self.parallel {
            let results: Vec<Result<FoldOutcome>> = splits
                .par_iter()
                .map(|split| self.run_fold(table, split))
                .collect();
            for (split, result) in splits.iter().zip(results) {
                self.resolve_fold(split, result, &mut outcomes)?;
            }
        } else {
            for split in &splits {
                let result = self.run_fold(table, split);
                self.resolve_fold(split, result, &mut outcomes)?;
            }
        }

        Ok(CvReport::from_outcomes(outcomes, requested))
    }

    fn resolve_fold(
        &self,
        split: &CvSplit,
        result: Result<FoldOutcome>,
        outcomes: &mut Vec<FoldOutcome>,
    ) -> Result<()> {
        match result {
            Ok(outcome) => outcomes.push(outcome),
            Err(err) if err.is_convergence() && self.policy == ConvergencePolicy::SkipFold => {
                warn!(fold = split.fold_idx, error = %err, "fold skipped: trainer did not converge");
                outcomes.push(FoldOutcome {
                    fold_idx: split.fold_idx,
                    n_train: split.train_indices.len(),
                    n_eval: split.test_indices.len(),
                    accuracy: None,
                });
            }
            Err(err) => return Err(err.in_fold(split.fold_idx)),
        }
        Ok(())
    }

    fn run_fold(&self, table: &EncodedTable, split: &CvSplit) -> Result<FoldOutcome> {
        let accuracy = train_and_score(
            self.trainer,
            table,
            &split.train_indices,
            &split.test_indices,
        )?;

        info!(
            fold = split.fold_idx,
            n_train = split.train_indices.len(),
            n_eval = split.test_indices.len(),
            accuracy,
            "fold evaluated"
        );

        Ok(FoldOutcome {
            fold_idx: split.fold_idx,
            n_train: split.train_indices.len(),
            n_eval: split.test_indices.len(),
            accuracy: Some(accuracy),
        })
    }
}

/// Single train/test split evaluation on the same train → predict → score
/// path as a cross-validation fold.
pub fn evaluate_holdout(
    trainer: &dyn Trainer,
    table: &EncodedTable,
    train_fraction: f64,
    seed: u64,
) -> Result<HoldoutReport> {
    let split = train_test_split(table.n_rows(), train_fraction, seed)?;
    let accuracy = train_and_score(trainer, table, &split.train_indices, &split.test_indices)?;

    Ok(HoldoutReport {
        accuracy,
        n_train: split.train_indices.len(),
        n_test: split.test_indices.len(),
    })
}

/// Train on the training rows, score the evaluation rows.
///
/// Standardization statistics come from the training rows only and are
/// applied to both subsets, so no evaluation statistics leak into training.
fn train_and_score(
    trainer: &dyn Trainer,
    table: &EncodedTable,
    train_indices: &[usize],
    eval_indices: &[usize],
) -> Result<f64> {
    let (x_train_raw, y_train) = table.take(train_indices);
    let (x_eval_raw, y_eval) = table.take(eval_indices);

    let mut scaler = StandardScaler::new();
    let x_train = scaler.fit_transform(&x_train_raw, &table.feature_names)?;
    let x_eval = scaler.transform(&x_eval_raw, &table.feature_names)?;

    let predictor = trainer.train(&x_train, &y_train, &table.layout)?;
    let scores = predictor.predict(&x_eval)?;

    onehot_accuracy(&scores, &y_eval)
}
