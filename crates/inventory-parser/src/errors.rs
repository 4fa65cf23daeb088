use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV header error: {0}")]
    Csv(#[from] csv::Error),

    #[error("file did not contain a header row")]
    MissingHeader,

    #[error("header declares {expected} columns, reader produced {found}")]
    HeaderMismatch { expected: usize, found: usize },

    #[error("CSV read failed: {0}")]
    Polars(#[from] polars::error::PolarsError),
}
