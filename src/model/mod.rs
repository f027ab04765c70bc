//! The trainer/predictor contract
//!
//! Training is a capability the evaluation pipeline consumes through a
//! narrow interface: a [`Trainer`] turns a training subset into an opaque
//! [`Predictor`], or reports failure to converge as a typed error. Each
//! predictor is bound to one training call, used for its paired evaluation
//! rows, then dropped.

mod mlp;

pub use mlp::{Activation, MlpConfig, MlpTrainer, OutputActivation, TrainedNet};

use ndarray::Array2;

use crate::error::Result;
use crate::preprocessing::ClassLayout;

/// A trained classifier producing per-class scores
pub trait Predictor: std::fmt::Debug + Send + Sync {
    /// Score each row against every class. Row order is preserved and
    /// columns follow the class ordering of the layout given at training
    /// time.
    fn predict(&self, x: &Array2<f64>) -> Result<Array2<f64>>;

    /// Number of score columns produced per row
    fn n_classes(&self) -> usize;
}

/// A trainable classification capability
pub trait Trainer: Send + Sync {
    /// Train on a feature matrix and its one-hot target matrix. The layout
    /// names the target columns so the predictor's score ordering matches
    /// the encoding used at evaluation time.
    ///
    /// Failing to converge within the trainer's step budget is a
    /// recoverable error ([`crate::FloranetError::Convergence`]), not a
    /// panic and never a silently degraded predictor.
    fn train(
        &self,
        x: &Array2<f64>,
        targets: &Array2<f64>,
        layout: &ClassLayout,
    ) -> Result<Box<dyn Predictor>>;
}
