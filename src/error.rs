//! Crate-wide error type.
//!
//! Every failure in this domain is terminal for the run: a batch similarity
//! computation either completes or aborts. There is no transient/permanent
//! distinction and no partial-result salvage.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    /// Malformed edge-list line: missing second column, a non-integer field,
    /// or a node id outside the dense `[0, N)` id space.
    #[error("malformed edge list at line {line}: {reason}")]
    Format { line: usize, reason: String },

    /// Unreadable input path or unwritable output path.
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    /// Matrices disagree on node count. Programming error, not input error.
    #[error("dimension mismatch: {0}")]
    Dimension(String),

    /// Parameter outside its domain: alpha/beta not in [0,1], zero
    /// iterations, zero topK.
    #[error("invalid parameter: {0}")]
    Parameter(String),
}

pub type Result<T> = std::result::Result<T, SimError>;
