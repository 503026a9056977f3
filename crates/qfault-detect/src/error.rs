//! Error types for fault injection and detection.

use qfault_hal::HalError;
use qfault_ir::IrError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised while injecting faults or running a detector.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FaultError {
    /// A fault model returned a replacement the injector cannot splice.
    #[error("Fault '{fault}' returned an invalid faulty behavior: {reason}")]
    InvalidFaultyBehavior {
        /// Description of the offending fault model.
        fault: String,
        /// What was wrong with the replacement.
        reason: String,
    },

    /// The replacement acts on a different number of qubits than the fault targets.
    #[error("Fault '{fault}' targets {expected} qubits but its replacement acts on {got}")]
    UnsupportedFaultReplacement {
        /// Description of the offending fault model.
        fault: String,
        /// Number of target qubits declared by the fault model.
        expected: usize,
        /// Number of qubits the replacement acts on.
        got: usize,
    },

    /// A statistic could not be computed from the given distributions.
    #[error("Statistical test failed: {0}")]
    StatisticalTest(String),

    /// Detector or campaign parameters make no sense.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The simulator oracle failed.
    #[error("Simulation error: {0}")]
    Simulation(#[from] HalError),

    /// A rewritten circuit failed validation.
    #[error("Circuit error: {0}")]
    Ir(#[from] IrError),

    /// Configuration could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for fault injection and detection.
pub type FaultResult<T> = Result<T, FaultError>;
