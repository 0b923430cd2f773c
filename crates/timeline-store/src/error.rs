use polars::prelude::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Source table not found at {path}: {source}")]
    MissingTable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Table '{table}' has no column '{column}'")]
    MissingColumn { table: &'static str, column: String },

    #[error("Failed to read columnar data: {0}")]
    Polars(#[from] PolarsError),

    #[error("No seasons requested")]
    NoSeasons,
}
