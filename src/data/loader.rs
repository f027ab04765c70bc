//! Table loading

use crate::error::{FloranetError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Loader for delimited text tables
pub struct CsvLoader {
    delimiter: u8,
    has_header: bool,
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvLoader {
    /// Create a new loader with comma delimiter and a header row
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
        }
    }

    /// Set the field delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set whether the file carries a header row
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Load a delimited file into a DataFrame
    pub fn load(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| FloranetError::Data(format!("{}: {}", path.display(), e)))?;

        let parse_opts = CsvParseOptions::default().with_separator(self.delimiter);

        let reader = CsvReadOptions::default()
            .with_has_header(self.has_header)
            .with_infer_schema_length(Some(100))
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file);

        reader
            .finish()
            .map_err(|e| FloranetError::Data(format!("{}: {}", path.display(), e)))
    }

    /// Pick the delimiter from the file extension and load
    pub fn load_auto(path: impl AsRef<Path>) -> Result<DataFrame> {
        let delimiter = match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some("tsv") => b'\t',
            _ => b',',
        };
        Self::new().with_delimiter(delimiter).load(path)
    }
}
