use std::io;

use arrow::error::ArrowError;

/// Failure to derive a schema from a compiled pattern.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("pattern must contain named capture groups")]
    NoNamedGroups,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to compile pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("arrow: {0}")]
    Arrow(#[from] ArrowError),

    #[error("io: {0}")]
    Io(#[from] io::Error),
}
