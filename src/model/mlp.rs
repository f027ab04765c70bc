//! Feed-forward network trainer
//!
//! Mini-batch gradient descent with momentum and L2 weight decay over a
//! one-hot target matrix. Training stops once the epoch-to-epoch training
//! loss delta falls below the convergence threshold; exhausting the step
//! budget first is a convergence failure.

use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use crate::error::{FloranetError, Result};
use crate::model::{Predictor, Trainer};
use crate::preprocessing::{select_rows, ClassLayout};

/// Hidden-layer activation function
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Activation {
    ReLU,
    Sigmoid,
    Tanh,
}

impl Default for Activation {
    fn default() -> Self {
        Self::ReLU
    }
}

/// Output-layer activation. One-hot targets need a non-linear output, so
/// there is no linear variant to misconfigure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OutputActivation {
    /// Normalized per-row class scores
    Softmax,
    /// Independent per-class scores
    Sigmoid,
}

impl Default for OutputActivation {
    fn default() -> Self {
        Self::Softmax
    }
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpConfig {
    /// Hidden layer widths
    pub hidden_layers: Vec<usize>,
    /// Hidden-layer activation
    pub activation: Activation,
    /// Output-layer activation
    pub output: OutputActivation,
    /// Learning rate
    pub learning_rate: f64,
    /// Step budget: maximum training epochs
    pub max_steps: usize,
    /// Mini-batch size
    pub batch_size: usize,
    /// Convergence threshold on the epoch loss delta
    pub threshold: f64,
    /// Momentum
    pub momentum: f64,
    /// L2 regularization strength
    pub alpha: f64,
    /// Random seed for weight initialization and batch shuffling
    pub random_state: Option<u64>,
}

impl Default for MlpConfig {
    fn default() -> Self {
        Self {
            hidden_layers: vec![16],
            activation: Activation::ReLU,
            output: OutputActivation::Softmax,
            learning_rate: 0.05,
            max_steps: 10_000,
            batch_size: 32,
            threshold: 1e-4,
            momentum: 0.9,
            alpha: 1e-4,
            random_state: Some(42),
        }
    }
}

impl MlpConfig {
    fn validate(&self) -> Result<()> {
        if self.hidden_layers.iter().any(|&w| w == 0) {
            return Err(FloranetError::InvalidParameter {
                name: "hidden_layers".to_string(),
                value: format!("{:?}", self.hidden_layers),
                reason: "layer widths must be positive".to_string(),
            });
        }
        if self.learning_rate <= 0.0 {
            return Err(FloranetError::InvalidParameter {
                name: "learning_rate".to_string(),
                value: self.learning_rate.to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if self.threshold <= 0.0 {
            return Err(FloranetError::InvalidParameter {
                name: "threshold".to_string(),
                value: self.threshold.to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if self.max_steps == 0 || self.batch_size == 0 {
            return Err(FloranetError::InvalidParameter {
                name: "max_steps/batch_size".to_string(),
                value: format!("{}/{}", self.max_steps, self.batch_size),
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Feed-forward network trainer
#[derive(Debug, Clone, Default)]
pub struct MlpTrainer {
    config: MlpConfig,
}

impl MlpTrainer {
    pub fn new(config: MlpConfig) -> Self {
        Self { config }
    }
}

impl Trainer for MlpTrainer {
    fn train(
        &self,
        x: &Array2<f64>,
        targets: &Array2<f64>,
        layout: &ClassLayout,
    ) -> Result<Box<dyn Predictor>> {
        self.config.validate()?;

        let n_samples = x.nrows();
        if n_samples == 0 {
            return Err(FloranetError::InvalidParameter {
                name: "rows".to_string(),
                value: "0".to_string(),
                reason: "cannot train on an empty matrix".to_string(),
            });
        }
        if targets.nrows() != n_samples {
            return Err(FloranetError::ShapeMismatch {
                expected: format!("{} target rows", n_samples),
                actual: format!("{} target rows", targets.nrows()),
            });
        }
        if targets.ncols() != layout.n_classes() {
            return Err(FloranetError::ShapeMismatch {
                expected: format!("{} target columns", layout.n_classes()),
                actual: format!("{} target columns", targets.ncols()),
            });
        }

        let mut rng = match self.config.random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        let mut net = TrainedNet::initialize(
            x.ncols(),
            layout.clone(),
            &self.config,
            &mut rng,
        );

        let mut velocities_w: Vec<Array2<f64>> = net
            .weights
            .iter()
            .map(|w| Array2::zeros(w.raw_dim()))
            .collect();
        let mut velocities_b: Vec<Array1<f64>> = net
            .biases
            .iter()
            .map(|b| Array1::zeros(b.len()))
            .collect();

        let mut indices: Vec<usize> = (0..n_samples).collect();
        let mut prev_loss = f64::INFINITY;
        let mut last_delta = f64::INFINITY;

        for step in 1..=self.config.max_steps {
            indices.shuffle(&mut rng);

            for batch_start in (0..n_samples).step_by(self.config.batch_size) {
                let batch_end = (batch_start + self.config.batch_size).min(n_samples);
                let batch = &indices[batch_start..batch_end];

                let x_batch = select_rows(x, batch);
                let y_batch = select_rows(targets, batch);

                let (activations, z_values) = net.forward(&x_batch);
                let gradients = net.backward(&y_batch, &activations, &z_values);

                for (i, (grad_w, grad_b)) in gradients.into_iter().enumerate() {
                    velocities_w[i] = &velocities_w[i] * self.config.momentum
                        - &grad_w * self.config.learning_rate;
                    velocities_b[i] = &velocities_b[i] * self.config.momentum
                        - &grad_b * self.config.learning_rate;

                    net.weights[i] = &net.weights[i] + &velocities_w[i];
                    net.biases[i] = &net.biases[i] + &velocities_b[i];

                    net.weights[i] =
                        &net.weights[i] * (1.0 - self.config.alpha * self.config.learning_rate);
                }
            }

            let loss = net.mean_loss(x, targets);
            last_delta = (prev_loss - loss).abs();
            if last_delta < self.config.threshold {
                tracing::debug!(step, loss, "training converged");
                return Ok(Box::new(net));
            }
            prev_loss = loss;
        }

        Err(FloranetError::Convergence {
            steps: self.config.max_steps,
            delta: last_delta,
            threshold: self.config.threshold,
        })
    }
}

/// A trained feed-forward network
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedNet {
    weights: Vec<Array2<f64>>,
    biases: Vec<Array1<f64>>,
    activation: Activation,
    output: OutputActivation,
    n_features: usize,
    layout: ClassLayout,
}

impl TrainedNet {
    fn initialize(
        n_features: usize,
        layout: ClassLayout,
        config: &MlpConfig,
        rng: &mut Xoshiro256PlusPlus,
    ) -> Self {
        let mut layer_sizes = vec![n_features];
        layer_sizes.extend(&config.hidden_layers);
        layer_sizes.push(layout.n_classes());

        let mut weights = Vec::with_capacity(layer_sizes.len() - 1);
        let mut biases = Vec::with_capacity(layer_sizes.len() - 1);

        for i in 0..layer_sizes.len() - 1 {
            let n_in = layer_sizes[i];
            let n_out = layer_sizes[i + 1];

            // Xavier/Glorot initialization
            let scale = (2.0 / (n_in + n_out) as f64).sqrt();
            let values: Vec<f64> = (0..n_in * n_out)
                .map(|_| rng.gen::<f64>() * 2.0 * scale - scale)
                .collect();

            weights.push(
                Array2::from_shape_vec((n_in, n_out), values)
                    .expect("weight matrix matches layer sizes"),
            );
            biases.push(Array1::zeros(n_out));
        }

        Self {
            weights,
            biases,
            activation: config.activation,
            output: config.output,
            n_features,
            layout,
        }
    }

    /// The class-column layout this net was trained against
    pub fn layout(&self) -> &ClassLayout {
        &self.layout
    }

    fn forward(&self, x: &Array2<f64>) -> (Vec<Array2<f64>>, Vec<Array2<f64>>) {
        let mut activations = vec![x.clone()];
        let mut z_values = Vec::new();

        for (i, (w, b)) in self.weights.iter().zip(self.biases.iter()).enumerate() {
            let z = activations.last().expect("non-empty activations").dot(w) + b;
            z_values.push(z.clone());

            let a = if i < self.weights.len() - 1 {
                hidden_activate(&z, self.activation)
            } else {
                output_activate(&z, self.output)
            };

            activations.push(a);
        }

        (activations, z_values)
    }

    fn backward(
        &self,
        y_batch: &Array2<f64>,
        activations: &[Array2<f64>],
        z_values: &[Array2<f64>],
    ) -> Vec<(Array2<f64>, Array1<f64>)> {
        let n = y_batch.nrows() as f64;
        let mut gradients = Vec::new();

        // Cross-entropy gradient against the output activation
        let output = activations.last().expect("non-empty activations");
        let mut delta = (output - y_batch) / n;

        for i in (0..self.weights.len()).rev() {
            let a_prev = &activations[i];

            let grad_w = a_prev.t().dot(&delta);
            let grad_b = delta.sum_axis(ndarray::Axis(0));

            gradients.push((grad_w, grad_b));

            if i > 0 {
                let z = &z_values[i - 1];
                delta = delta.dot(&self.weights[i].t()) * hidden_derivative(z, self.activation);
            }
        }

        gradients.reverse();
        gradients
    }

    /// Mean cross-entropy over a feature/target pair
    fn mean_loss(&self, x: &Array2<f64>, targets: &Array2<f64>) -> f64 {
        let (activations, _) = self.forward(x);
        let scores = activations.last().expect("non-empty activations");

        let mut total = 0.0;
        for (score_row, target_row) in scores.rows().into_iter().zip(targets.rows()) {
            for (&p, &t) in score_row.iter().zip(target_row.iter()) {
                if t > 0.0 {
                    total -= t * p.max(1e-12).ln();
                }
            }
        }
        total / x.nrows() as f64
    }
}

impl Predictor for TrainedNet {
    fn predict(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.n_features {
            return Err(FloranetError::ShapeMismatch {
                expected: format!("{} feature columns", self.n_features),
                actual: format!("{} feature columns", x.ncols()),
            });
        }
        let (activations, _) = self.forward(x);
        Ok(activations.last().expect("non-empty activations").clone())
    }

    fn n_classes(&self) -> usize {
        self.layout.n_classes()
    }
}

fn hidden_activate(z: &Array2<f64>, activation: Activation) -> Array2<f64> {
    match activation {
        Activation::ReLU => z.mapv(|v| v.max(0.0)),
        Activation::Sigmoid => z.mapv(|v| 1.0 / (1.0 + (-v).exp())),
        Activation::Tanh => z.mapv(|v| v.tanh()),
    }
}

fn hidden_derivative(z: &Array2<f64>, activation: Activation) -> Array2<f64> {
    match activation {
        Activation::ReLU => z.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 }),
        Activation::Sigmoid => {
            let sig = hidden_activate(z, Activation::Sigmoid);
            &sig * &(1.0 - &sig)
        }
        Activation::Tanh => {
            let t = z.mapv(|v| v.tanh());
            1.0 - &t * &t
        }
    }
}

fn output_activate(z: &Array2<f64>, output: OutputActivation) -> Array2<f64> {
    match output {
        OutputActivation::Sigmoid => z.mapv(|v| 1.0 / (1.0 + (-v).exp())),
        OutputActivation::Softmax => {
            let mut result = z.clone();
            for mut row in result.rows_mut() {
                let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                let exp_sum: f64 = row.iter().map(|&v| (v - max).exp()).sum();
                for v in row.iter_mut() {
                    *v = (*v - max).exp() / exp_sum;
                }
            }
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn two_cluster_data() -> (Array2<f64>, Array2<f64>, ClassLayout) {
        // two well-separated clusters, 10 rows each
        let mut rows = Vec::new();
        let mut targets = Vec::new();
        for i in 0..10 {
            let jitter = (i as f64) * 0.02;
            rows.extend([-2.0 + jitter, -2.0 - jitter]);
            targets.extend([1.0, 0.0]);
            rows.extend([2.0 - jitter, 2.0 + jitter]);
            targets.extend([0.0, 1.0]);
        }
        let x = Array2::from_shape_vec((20, 2), rows).unwrap();
        let y = Array2::from_shape_vec((20, 2), targets).unwrap();
        let layout = ClassLayout {
            label: "kind".to_string(),
            classes: vec!["low".to_string(), "high".to_string()],
        };
        (x, y, layout)
    }

    fn quick_config() -> MlpConfig {
        MlpConfig {
            hidden_layers: vec![8],
            learning_rate: 0.1,
            max_steps: 10_000,
            batch_size: 32,
            threshold: 1e-4,
            random_state: Some(7),
            ..Default::default()
        }
    }

    #[test]
    fn test_train_separates_clusters() {
        let (x, y, layout) = two_cluster_data();
        let trainer = MlpTrainer::new(quick_config());

        let net = trainer.train(&x, &y, &layout).unwrap();
        let scores = net.predict(&x).unwrap();

        assert_eq!(scores.dim(), (20, 2));
        for i in 0..20 {
            let predicted = if scores[[i, 0]] >= scores[[i, 1]] { 0 } else { 1 };
            let truth = if y[[i, 0]] == 1.0 { 0 } else { 1 };
            assert_eq!(predicted, truth, "row {} misclassified", i);
        }
    }

    #[test]
    fn test_softmax_scores_sum_to_one() {
        let (x, y, layout) = two_cluster_data();
        let trainer = MlpTrainer::new(quick_config());

        let net = trainer.train(&x, &y, &layout).unwrap();
        let scores = net.predict(&x).unwrap();

        for row in scores.rows() {
            assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_seeded_training_is_deterministic() {
        let (x, y, layout) = two_cluster_data();
        let trainer = MlpTrainer::new(quick_config());

        let a = trainer.train(&x, &y, &layout).unwrap().predict(&x).unwrap();
        let b = trainer.train(&x, &y, &layout).unwrap().predict(&x).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_step_budget_exhaustion_is_convergence_failure() {
        let (x, y, layout) = two_cluster_data();
        let config = MlpConfig {
            max_steps: 2,
            threshold: 1e-15,
            ..quick_config()
        };
        let trainer = MlpTrainer::new(config);

        let err = trainer.train(&x, &y, &layout).unwrap_err();
        assert!(matches!(err, FloranetError::Convergence { steps: 2, .. }));
    }

    #[test]
    fn test_target_shape_is_checked() {
        let (x, _, layout) = two_cluster_data();
        let bad_targets = array![[1.0, 0.0], [0.0, 1.0]];
        let trainer = MlpTrainer::new(quick_config());

        let err = trainer.train(&x, &bad_targets, &layout).unwrap_err();
        assert!(matches!(err, FloranetError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_predict_rejects_wrong_feature_count() {
        let (x, y, layout) = two_cluster_data();
        let trainer = MlpTrainer::new(quick_config());
        let net = trainer.train(&x, &y, &layout).unwrap();

        let wrong = array![[1.0, 2.0, 3.0]];
        let err = net.predict(&wrong).unwrap_err();
        assert!(matches!(err, FloranetError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let (x, y, layout) = two_cluster_data();
        let config = MlpConfig {
            learning_rate: 0.0,
            ..Default::default()
        };
        let err = MlpTrainer::new(config).train(&x, &y, &layout).unwrap_err();
        assert!(matches!(err, FloranetError::InvalidParameter { .. }));
    }
}
