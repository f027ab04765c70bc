//! Table loading and data quality reporting
//!
//! The input contract is a row-oriented text table with a header: an
//! identifier column, numeric feature columns, and a categorical label
//! column.

mod loader;
mod quality;

pub use loader::CsvLoader;
pub use quality::{ColumnSummary, QualityReport, QualityWarning};
