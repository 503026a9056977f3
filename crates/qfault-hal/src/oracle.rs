//! The simulator oracle abstraction.

use qfault_ir::Circuit;

use crate::distribution::OutcomeDistribution;
use crate::error::HalResult;

/// A backend that maps a measured circuit to sampled classical outcomes.
///
/// Implementations must be deterministic for a fixed `seed`: executing the
/// same circuit with the same shot count and seed returns identical counts.
/// `seed = None` draws fresh, independent randomness on every call. No
/// random state may be shared between calls, so one oracle can serve
/// several threads at once.
pub trait Oracle: Send + Sync {
    /// Get the oracle name.
    fn name(&self) -> &str;

    /// Widest circuit the oracle accepts.
    fn max_qubits(&self) -> usize;

    /// Execute `circuit` for `shots` samples and return raw shot counts keyed
    /// by classical bitstring.
    fn execute(
        &self,
        circuit: &Circuit,
        shots: u32,
        seed: Option<u64>,
    ) -> HalResult<OutcomeDistribution>;
}

impl<O: Oracle + ?Sized> Oracle for &O {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn max_qubits(&self) -> usize {
        (**self).max_qubits()
    }

    fn execute(
        &self,
        circuit: &Circuit,
        shots: u32,
        seed: Option<u64>,
    ) -> HalResult<OutcomeDistribution> {
        (**self).execute(circuit, shots, seed)
    }
}
