//! One-hot target encoding

use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{FloranetError, Result};

/// The named class-column layout shared by encoding, training, and
/// evaluation. Column `j` of every target and score matrix corresponds to
/// `classes[j]`; any disagreement on this ordering corrupts accuracy
/// silently, so it is carried as one value rather than re-derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassLayout {
    pub label: String,
    pub classes: Vec<String>,
}

impl ClassLayout {
    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Index of a class within the layout
    pub fn class_index(&self, class: &str) -> Option<usize> {
        self.classes.iter().position(|c| c == class)
    }

    /// Names of the one-hot columns, `{label}_{class}`
    pub fn column_names(&self) -> Vec<String> {
        self.classes
            .iter()
            .map(|c| format!("{}_{}", self.label, c))
            .collect()
    }
}

/// One-hot encoder for the categorical label column.
///
/// The class ordering is fixed and caller-visible: the declared list when
/// one is given, otherwise the sorted unique labels seen at fit time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetEncoder {
    column: String,
    classes: Vec<String>,
    is_fitted: bool,
}

impl TargetEncoder {
    /// Create an encoder that infers its class set at fit time
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            classes: Vec::new(),
            is_fitted: false,
        }
    }

    /// Declare the class set (and its ordering) up front
    pub fn with_classes(mut self, classes: Vec<String>) -> Self {
        self.classes = classes;
        self.is_fitted = !self.classes.is_empty();
        self
    }

    /// Infer the class set from the label column, sorted for a stable ordering
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        if !self.is_fitted {
            let labels = self.label_values(df)?;
            let mut classes = labels;
            classes.sort();
            classes.dedup();
            self.classes = classes;
            self.is_fitted = true;
        }
        Ok(self)
    }

    /// The fitted layout
    pub fn layout(&self) -> Result<ClassLayout> {
        if !self.is_fitted {
            return Err(FloranetError::NotFitted);
        }
        Ok(ClassLayout {
            label: self.column.clone(),
            classes: self.classes.clone(),
        })
    }

    /// Encode the label column as a one-hot matrix plus per-row class indices
    pub fn encode(&self, df: &DataFrame) -> Result<(Array2<f64>, Vec<usize>)> {
        if !self.is_fitted {
            return Err(FloranetError::NotFitted);
        }

        let labels = self.label_values(df)?;
        let n = labels.len();
        let c = self.classes.len();

        let mut onehot = Array2::zeros((n, c));
        let mut class_indices = Vec::with_capacity(n);

        for (i, label) in labels.iter().enumerate() {
            let idx = self.classes.iter().position(|k| k == label).ok_or_else(|| {
                FloranetError::Encoding(format!(
                    "unknown class '{}' in column '{}' at row {}",
                    label, self.column, i
                ))
            })?;
            onehot[[i, idx]] = 1.0;
            class_indices.push(idx);
        }

        Ok((onehot, class_indices))
    }

    /// Return a new frame with one binary `{label}_{class}` column appended
    /// per class. The input frame is not modified.
    pub fn augment(&self, df: &DataFrame) -> Result<DataFrame> {
        let (onehot, _) = self.encode(df)?;
        let layout = self.layout()?;

        let mut result = df.clone();
        for (j, col_name) in layout.column_names().into_iter().enumerate() {
            let values: Vec<i32> = onehot.column(j).iter().map(|&v| v as i32).collect();
            let series = Series::new(col_name.into(), values);
            result = result
                .with_column(series)
                .map_err(|e| FloranetError::Data(e.to_string()))?
                .clone();
        }

        Ok(result)
    }

    fn label_values(&self, df: &DataFrame) -> Result<Vec<String>> {
        let column = df
            .column(&self.column)
            .map_err(|_| FloranetError::FeatureNotFound(self.column.clone()))?;
        let ca = column
            .as_materialized_series()
            .str()
            .map_err(|e| FloranetError::Data(e.to_string()))?;

        let mut out = Vec::with_capacity(ca.len());
        for (i, v) in ca.into_iter().enumerate() {
            match v {
                Some(s) => out.push(s.to_string()),
                None => {
                    return Err(FloranetError::Encoding(format!(
                        "missing label in column '{}' at row {}",
                        self.column, i
                    )))
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_df() -> DataFrame {
        df!(
            "width" => &[1.0, 2.0, 3.0, 4.0],
            "species" => &["rose", "fern", "rose", "lily"]
        )
        .unwrap()
    }

    #[test]
    fn test_inferred_classes_are_sorted() {
        let mut encoder = TargetEncoder::new("species");
        encoder.fit(&sample_df()).unwrap();

        let layout = encoder.layout().unwrap();
        assert_eq!(layout.classes, vec!["fern", "lily", "rose"]);
        assert_eq!(
            layout.column_names(),
            vec!["species_fern", "species_lily", "species_rose"]
        );
    }

    #[test]
    fn test_encode_is_one_hot() {
        let mut encoder = TargetEncoder::new("species");
        encoder.fit(&sample_df()).unwrap();

        let (onehot, class_indices) = encoder.encode(&sample_df()).unwrap();
        assert_eq!(onehot.dim(), (4, 3));
        assert_eq!(class_indices, vec![2, 0, 2, 1]);

        for i in 0..4 {
            let row_sum: f64 = onehot.row(i).sum();
            assert_eq!(row_sum, 1.0);
            assert_eq!(onehot[[i, class_indices[i]]], 1.0);
        }
    }

    #[test]
    fn test_declared_class_ordering_wins() {
        let encoder = TargetEncoder::new("species").with_classes(vec![
            "rose".to_string(),
            "lily".to_string(),
            "fern".to_string(),
        ]);

        let (_, class_indices) = encoder.encode(&sample_df()).unwrap();
        assert_eq!(class_indices, vec![0, 2, 0, 1]);
    }

    #[test]
    fn test_unknown_class_is_an_error() {
        let encoder =
            TargetEncoder::new("species").with_classes(vec!["rose".to_string(), "lily".to_string()]);

        let err = encoder.encode(&sample_df()).unwrap_err();
        assert!(matches!(err, FloranetError::Encoding(_)));
        assert!(err.to_string().contains("fern"));
    }

    #[test]
    fn test_augment_appends_binary_columns() {
        let mut encoder = TargetEncoder::new("species");
        let df = sample_df();
        encoder.fit(&df).unwrap();

        let augmented = encoder.augment(&df).unwrap();
        assert_eq!(augmented.width(), df.width() + 3);
        // input untouched
        assert_eq!(df.width(), 2);

        let rose = augmented.column("species_rose").unwrap();
        let values: Vec<i32> = rose.i32().unwrap().into_no_null_iter().collect();
        assert_eq!(values, vec![1, 0, 1, 0]);
    }
}
