//! Error types for the dataset cleaner

use polars::prelude::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a cleaning failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Parse,
    Unexpected,
}

#[derive(Error, Debug)]
pub enum CleanerError {
    #[error("Source file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Parse error in {context}: {cause}")]
    Parse { context: String, cause: String },

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl CleanerError {
    pub fn parse(context: impl Into<String>, cause: impl ToString) -> Self {
        CleanerError::Parse {
            context: context.into(),
            cause: cause.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CleanerError::NotFound(_) => ErrorKind::NotFound,
            CleanerError::Parse { .. } => ErrorKind::Parse,
            CleanerError::Unexpected(_) => ErrorKind::Unexpected,
        }
    }
}

// Parse-phase call sites map their errors explicitly; anything reaching these
// conversions happened while transforming an already-loaded table.
impl From<PolarsError> for CleanerError {
    fn from(err: PolarsError) -> Self {
        CleanerError::Unexpected(err.to_string())
    }
}

impl From<std::io::Error> for CleanerError {
    fn from(err: std::io::Error) -> Self {
        CleanerError::Unexpected(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CleanerError>;
