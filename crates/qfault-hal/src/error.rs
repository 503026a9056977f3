//! Oracle and distribution errors.

use thiserror::Error;

/// Failures while sampling a circuit or normalizing its outcomes.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HalError {
    #[error("cannot sample {shots} shots")]
    InvalidShots { shots: u32 },

    /// The circuit is wider than the oracle can hold.
    #[error("oracle '{oracle}' holds {available} qubits, circuit needs {required}")]
    CircuitTooLarge {
        oracle: String,
        required: usize,
        available: usize,
    },

    #[error("circuit rejected by oracle: {0}")]
    InvalidCircuit(String),

    /// An operation the oracle has no semantics for, e.g. an opaque gate
    /// without a matrix or a gate after measurement.
    #[error("oracle cannot execute {0}")]
    Unsupported(String),

    /// Total mass is zero, negative or not finite.
    #[error("distribution cannot be normalized: {0}")]
    Normalization(String),

    /// Any other oracle-side failure.
    #[error("oracle failed: {0}")]
    Backend(String),
}

pub type HalResult<T> = Result<T, HalError>;
