//! Feature standardization and one-hot target encoding
//!
//! Column references are resolved by name exactly once, here; everything
//! downstream works on matrices plus the [`ClassLayout`] produced at
//! encoding time.

mod encoder;
mod scaler;

pub use encoder::{ClassLayout, TargetEncoder};
pub use scaler::StandardScaler;

use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{FloranetError, Result};

/// Copy the given rows of a matrix into a new matrix
pub(crate) fn select_rows(m: &Array2<f64>, indices: &[usize]) -> Array2<f64> {
    let n_cols = m.ncols();
    let mut rows = Vec::with_capacity(indices.len() * n_cols);
    for &i in indices {
        rows.extend(m.row(i).iter().copied());
    }
    Array2::from_shape_vec((indices.len(), n_cols), rows).expect("row selection preserves shape")
}

/// A table resolved into matrices: raw (unscaled) features, one-hot
/// targets, per-row class indices, and the shared class-column layout.
#[derive(Debug, Clone)]
pub struct EncodedTable {
    pub features: Array2<f64>,
    pub feature_names: Vec<String>,
    pub targets: Array2<f64>,
    pub class_indices: Vec<usize>,
    pub layout: ClassLayout,
}

impl EncodedTable {
    pub fn n_rows(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    pub fn n_classes(&self) -> usize {
        self.layout.n_classes()
    }

    /// Feature and target rows for the given indices
    pub fn take(&self, indices: &[usize]) -> (Array2<f64>, Array2<f64>) {
        (
            select_rows(&self.features, indices),
            select_rows(&self.targets, indices),
        )
    }
}

/// Binds the named feature columns and label column of a table and turns
/// it into the encoded form the evaluation pipeline consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preprocessor {
    feature_columns: Vec<String>,
    label_column: String,
    classes: Option<Vec<String>>,
}

impl Preprocessor {
    /// Create a preprocessor for the given feature and label columns
    pub fn new(feature_columns: Vec<String>, label_column: impl Into<String>) -> Self {
        Self {
            feature_columns,
            label_column: label_column.into(),
            classes: None,
        }
    }

    /// Declare the class set and its ordering instead of inferring it
    pub fn with_classes(mut self, classes: Vec<String>) -> Self {
        self.classes = Some(classes);
        self
    }

    pub fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    pub fn label_column(&self) -> &str {
        &self.label_column
    }

    /// Resolve the table into matrices.
    ///
    /// Features are left unscaled here: the evaluation pipeline fits
    /// standardization statistics per training subset, never from rows it
    /// will be evaluated on.
    pub fn encode(&self, df: &DataFrame) -> Result<EncodedTable> {
        let features = self.feature_matrix(df)?;

        let mut encoder = self.build_encoder();
        encoder.fit(df)?;
        let (targets, class_indices) = encoder.encode(df)?;
        let layout = encoder.layout()?;

        Ok(EncodedTable {
            features,
            feature_names: self.feature_columns.clone(),
            targets,
            class_indices,
            layout,
        })
    }

    /// Whole-table transform: a new frame with every feature column
    /// standardized (statistics from the full table) and one binary column
    /// appended per class. The input frame is not modified.
    pub fn augment(&self, df: &DataFrame) -> Result<DataFrame> {
        let features = self.feature_matrix(df)?;
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&features, &self.feature_columns)?;

        let mut result = df.clone();
        for (j, name) in self.feature_columns.iter().enumerate() {
            let values: Vec<f64> = scaled.column(j).iter().copied().collect();
            let series = Series::new(name.as_str().into(), values);
            result = result
                .with_column(series)
                .map_err(|e| FloranetError::Data(e.to_string()))?
                .clone();
        }

        let mut encoder = self.build_encoder();
        encoder.fit(df)?;
        encoder.augment(&result)
    }

    fn build_encoder(&self) -> TargetEncoder {
        match &self.classes {
            Some(classes) => {
                TargetEncoder::new(self.label_column.clone()).with_classes(classes.clone())
            }
            None => TargetEncoder::new(self.label_column.clone()),
        }
    }

    fn feature_matrix(&self, df: &DataFrame) -> Result<Array2<f64>> {
        let n = df.height();
        let mut out = Array2::zeros((n, self.feature_columns.len()));

        for (j, name) in self.feature_columns.iter().enumerate() {
            let column = df
                .column(name.as_str())
                .map_err(|_| FloranetError::FeatureNotFound(name.clone()))?;
            let series = column
                .as_materialized_series()
                .cast(&DataType::Float64)
                .map_err(|_| {
                    FloranetError::Data(format!("column '{}' is not numeric", name))
                })?;
            let ca = series.f64().map_err(|e| FloranetError::Data(e.to_string()))?;

            for (i, v) in ca.into_iter().enumerate() {
                match v {
                    Some(x) => out[[i, j]] = x,
                    None => {
                        return Err(FloranetError::Data(format!(
                            "missing value in column '{}' at row {}",
                            name, i
                        )))
                    }
                }
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample_df() -> DataFrame {
        df!(
            "id" => &[1i64, 2, 3, 4],
            "width" => &[1.0, 2.0, 3.0, 4.0],
            "height" => &[4.0, 3.0, 2.0, 1.0],
            "species" => &["rose", "fern", "rose", "fern"]
        )
        .unwrap()
    }

    fn preprocessor() -> Preprocessor {
        Preprocessor::new(vec!["width".to_string(), "height".to_string()], "species")
    }

    #[test]
    fn test_encode_shapes_and_layout() {
        let table = preprocessor().encode(&sample_df()).unwrap();

        assert_eq!(table.n_rows(), 4);
        assert_eq!(table.n_features(), 2);
        assert_eq!(table.n_classes(), 2);
        assert_eq!(table.layout.classes, vec!["fern", "rose"]);
        assert_eq!(table.class_indices, vec![1, 0, 1, 0]);
        // features stay raw
        assert_eq!(table.features[[0, 0]], 1.0);
        assert_eq!(table.features[[3, 1]], 1.0);
    }

    #[test]
    fn test_take_rows() {
        let table = preprocessor().encode(&sample_df()).unwrap();
        let (x, y) = table.take(&[2, 0]);

        assert_eq!(x, array![[3.0, 2.0], [1.0, 4.0]]);
        assert_eq!(y.row(0).to_vec(), vec![0.0, 1.0]);
        assert_eq!(y.row(1).to_vec(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_augment_scales_and_appends() {
        let df = sample_df();
        let augmented = preprocessor().augment(&df).unwrap();

        // original frame untouched, new frame widened by one column per class
        assert_eq!(df.width(), 4);
        assert_eq!(augmented.width(), 6);

        let width = augmented.column("width").unwrap();
        let mean: f64 = width.f64().unwrap().mean().unwrap();
        assert!(mean.abs() < 1e-12);

        assert!(augmented.column("species_fern").is_ok());
        assert!(augmented.column("species_rose").is_ok());
    }

    #[test]
    fn test_missing_feature_column() {
        let bad = Preprocessor::new(vec!["petals".to_string()], "species");
        let err = bad.encode(&sample_df()).unwrap_err();
        assert!(matches!(err, FloranetError::FeatureNotFound(_)));
    }

    #[test]
    fn test_null_feature_value() {
        let df = df!(
            "width" => &[Some(1.0), None, Some(3.0)],
            "species" => &["rose", "fern", "rose"]
        )
        .unwrap();

        let pre = Preprocessor::new(vec!["width".to_string()], "species");
        let err = pre.encode(&df).unwrap_err();
        assert!(matches!(err, FloranetError::Data(_)));
        assert!(err.to_string().contains("row 1"));
    }
}
