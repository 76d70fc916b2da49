//! Error types for hglearn.
//!
//! Loading and configuration failures are fatal and surface before any
//! training happens. Degenerate training steps (a mismatch with no
//! failing pair) are not errors at all; the training loop just resamples.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the library.
#[derive(Debug, Error)]
pub enum HgError {
    /// Input data does not satisfy the grammar/dataset invariants.
    ///
    /// # When This Occurs
    ///
    /// - A violation row is shorter than an active constraint id requires
    /// - A target id is missing from its input's candidate pool
    /// - A count is negative or not a number
    #[error("Malformed input ({origin}): {reason}")]
    MalformedInput {
        /// File, input id or record the problem was found in
        origin: String,
        /// What is wrong with it
        reason: String,
    },

    /// Training options rejected before the run starts.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// A violation vector and a weight vector have different lengths.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Length of the weight vector
        expected: usize,
        /// Length of the violation vector
        actual: usize,
    },

    /// An input id with no grammar entry.
    #[error("Unknown input: {0}")]
    UnknownInput(String),

    /// Reading an input file failed.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl HgError {
    pub(crate) fn malformed(origin: impl Into<String>, reason: impl Into<String>) -> Self {
        HgError::MalformedInput {
            origin: origin.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HgError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, HgError>;
