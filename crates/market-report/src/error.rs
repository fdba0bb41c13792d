//! Report error types.

use std::io;
use thiserror::Error;

/// Errors raised while aggregating or persisting results
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },

    #[error("cannot summarize an empty sample")]
    EmptySample,
}
