//! Data quality reporting
//!
//! A pass over the loaded table before any preprocessing: per-column null
//! counts and warnings for columns the pipeline cannot use as-is.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;

/// Missingness ratio above which a column is flagged
const HIGH_MISSINGNESS: f64 = 0.2;

/// Summary of a single column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub name: String,
    pub null_count: usize,
    pub distinct: usize,
}

/// Quality warning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum QualityWarning {
    /// Column has a high proportion of missing values
    HighMissingness { column: String, ratio: f64 },
    /// Column holds a single value
    ConstantColumn { column: String },
}

/// Quality report for a loaded table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub n_rows: usize,
    pub n_columns: usize,
    pub columns: Vec<ColumnSummary>,
    pub warnings: Vec<QualityWarning>,
}

impl QualityReport {
    /// Scan a DataFrame for missing values and degenerate columns
    pub fn scan(df: &DataFrame) -> Result<Self> {
        let n_rows = df.height();
        let mut columns = Vec::with_capacity(df.width());
        let mut warnings = Vec::new();

        for column in df.get_columns() {
            let series = column.as_materialized_series();
            let name = series.name().to_string();
            let null_count = series.null_count();
            let distinct = series.n_unique()?;

            if n_rows > 0 {
                let ratio = null_count as f64 / n_rows as f64;
                if ratio > HIGH_MISSINGNESS {
                    warnings.push(QualityWarning::HighMissingness {
                        column: name.clone(),
                        ratio,
                    });
                }
            }

            if n_rows > 1 && distinct == 1 {
                warnings.push(QualityWarning::ConstantColumn {
                    column: name.clone(),
                });
            }

            columns.push(ColumnSummary {
                name,
                null_count,
                distinct,
            });
        }

        Ok(Self {
            n_rows,
            n_columns: df.width(),
            columns,
            warnings,
        })
    }

    /// Total missing values across all columns
    pub fn total_missing(&self) -> usize {
        self.columns.iter().map(|c| c.null_count).sum()
    }

    /// Emit the report through tracing
    pub fn log(&self) {
        info!(
            rows = self.n_rows,
            columns = self.n_columns,
            missing = self.total_missing(),
            "table scanned"
        );
        for c in &self.columns {
            if c.null_count > 0 {
                warn!(column = %c.name, nulls = c.null_count, "missing values");
            }
        }
        for w in &self.warnings {
            match w {
                QualityWarning::HighMissingness { column, ratio } => {
                    warn!(column = %column, ratio, "high missingness");
                }
                QualityWarning::ConstantColumn { column } => {
                    warn!(column = %column, "constant column");
                }
            }
        }
    }
}
