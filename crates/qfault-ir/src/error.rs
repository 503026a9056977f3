//! Circuit construction errors.

use crate::qubit::{ClbitId, QubitId};
use thiserror::Error;

/// Raised when an instruction does not fit the circuit it is pushed onto.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    #[error("{op}: qubit {qubit} is outside the circuit")]
    QubitNotFound { qubit: QubitId, op: String },

    #[error("{op}: classical bit {clbit} is outside the circuit")]
    ClbitNotFound { clbit: ClbitId, op: String },

    /// Operand count differs from the gate's arity.
    #[error("{gate_name} acts on {expected} qubits but was given {got}")]
    QubitCountMismatch {
        gate_name: String,
        expected: u32,
        got: u32,
    },

    #[error("{op}: qubit {qubit} appears twice")]
    DuplicateQubit { qubit: QubitId, op: String },

    /// A custom unitary must have `(2^n)^2` entries.
    #[error("unitary for {gate_name} has {got} entries instead of {expected}")]
    MatrixDimension {
        gate_name: String,
        expected: usize,
        got: usize,
    },

    /// Measurements pair `qubits[i]` with `clbits[i]`.
    #[error("measurement pairs {qubits} qubits with {clbits} classical bits")]
    MeasureArity { qubits: usize, clbits: usize },
}

pub type IrResult<T> = Result<T, IrError>;
