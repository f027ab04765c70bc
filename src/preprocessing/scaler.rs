//! Feature standardization

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{FloranetError, Result};

/// Per-column statistics for a fitted scaler
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ColumnStats {
    mean: f64,
    std: f64,
}

/// Standard scaler: (x - mean) / std per column.
///
/// Statistics are keyed by column name and computed from whatever row
/// subset `fit` is given, so cross-validation can fit on training rows only
/// and apply the same statistics to the held-out rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    params: HashMap<String, ColumnStats>,
    is_fitted: bool,
}

impl StandardScaler {
    /// Create a new unfitted scaler
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit per-column mean and standard deviation.
    ///
    /// A zero-variance column makes standardization undefined and is
    /// reported as an encoding error rather than silently rescaled.
    pub fn fit(&mut self, x: &Array2<f64>, names: &[String]) -> Result<&mut Self> {
        if x.ncols() != names.len() {
            return Err(FloranetError::ShapeMismatch {
                expected: format!("{} columns", names.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }
        let n = x.nrows();
        if n < 2 {
            return Err(FloranetError::Encoding(format!(
                "cannot standardize over {} row(s)",
                n
            )));
        }

        self.params.clear();
        for (j, name) in names.iter().enumerate() {
            let col = x.column(j);
            let mean = col.sum() / n as f64;
            let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n as f64 - 1.0);
            let std = var.sqrt();

            if std == 0.0 {
                return Err(FloranetError::Encoding(format!(
                    "column '{}' has zero variance",
                    name
                )));
            }

            self.params.insert(name.clone(), ColumnStats { mean, std });
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Apply the fitted statistics to a matrix with the same named columns
    pub fn transform(&self, x: &Array2<f64>, names: &[String]) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(FloranetError::NotFitted);
        }
        if x.ncols() != names.len() {
            return Err(FloranetError::ShapeMismatch {
                expected: format!("{} columns", names.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }

        let mut out = x.clone();
        for (j, name) in names.iter().enumerate() {
            let stats = self
                .params
                .get(name)
                .ok_or_else(|| FloranetError::FeatureNotFound(name.clone()))?;
            for v in out.column_mut(j).iter_mut() {
                *v = (*v - stats.mean) / stats.std;
            }
        }

        Ok(out)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, x: &Array2<f64>, names: &[String]) -> Result<Array2<f64>> {
        self.fit(x, names)?;
        self.transform(x, names)
    }
}
