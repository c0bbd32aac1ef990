use std::path::PathBuf;

use polars::prelude::PolarsError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChdError>;

#[derive(Error, Debug)]
pub enum ChdError {
    #[error("cannot read model artifact {path:?}: {source}")]
    ModelIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid model artifact {path:?}: {message}")]
    ModelFormat { path: PathBuf, message: String },
    #[error("model was trained on columns {found:?}, expected {expected:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("model returned label {0}, expected 0 or 1")]
    UnexpectedLabel(i32),
    #[error("invalid value {value:?} for {field}, expected one of {expected:?}")]
    InvalidCategory {
        field: &'static str,
        value: String,
        expected: &'static [&'static str],
    },
    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("missing value in row {row}, column {column:?}")]
    MissingValue { row: usize, column: &'static str },
    #[error("unsupported file format {path:?}, expected .csv or .parquet")]
    UnsupportedFormat { path: PathBuf },
    #[error("failed to read config file {path:?}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error(transparent)]
    Polars(#[from] PolarsError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
