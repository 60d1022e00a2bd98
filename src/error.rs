//! Error types for meshlu

use crate::mesh::{Direction, PeCoord};
use thiserror::Error;

/// Result type alias using meshlu's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring, running or validating a factorization
#[derive(Error, Debug)]
pub enum Error {
    /// Run configuration rejected before any computation started
    #[error("Invalid configuration: {reason}")]
    Configuration {
        /// Why the configuration was rejected
        reason: String,
    },

    /// Shape mismatch between an input and what the operation expects
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected shape
        expected: Vec<usize>,
        /// Actual shape
        got: Vec<usize>,
    },

    /// Invalid argument provided to an operation
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// The argument name
        arg: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// Exact zero pivot met by a pivoted factorization
    #[error("Singular matrix: zero pivot in diagonal tile {tile} at local step {step}")]
    SingularPivot {
        /// Diagonal tile index
        tile: usize,
        /// Elimination step inside the tile
        step: usize,
    },

    /// A channel delivery broke the mesh protocol
    #[error("Protocol violation at PE {pe}: {reason}")]
    Protocol {
        /// The processing element that detected the violation
        pe: PeCoord,
        /// Description of the violation
        reason: String,
    },

    /// The peer on the other side of a channel hung up
    #[error("Channel {direction:?} of PE {pe} closed by its peer")]
    ChannelClosed {
        /// The processing element owning the endpoint
        pe: PeCoord,
        /// Direction of the endpoint
        direction: Direction,
    },

    /// Distributed result diverged from the reference beyond tolerance
    #[error("Validation failed: error {error:e} exceeds threshold {threshold:e}")]
    ValidationFailed {
        /// Accumulated error that was measured
        error: f64,
        /// Bound the error had to stay under
        threshold: f64,
    },

    /// Reading or writing channel trace files failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a configuration error
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Create a shape mismatch error
    pub fn shape_mismatch(expected: &[usize], got: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    }

    /// Create a protocol violation error
    pub fn protocol(pe: PeCoord, reason: impl Into<String>) -> Self {
        Self::Protocol {
            pe,
            reason: reason.into(),
        }
    }

    /// Whether this error is a consequence of another PE failing first
    pub(crate) fn is_cascade(&self) -> bool {
        matches!(self, Self::ChannelClosed { .. })
    }
}
