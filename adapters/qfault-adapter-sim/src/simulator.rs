//! Simulator backend implementation.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use std::time::Instant;
use tracing::{debug, instrument};

use qfault_hal::{HalError, HalResult, Oracle, OutcomeDistribution};
use qfault_ir::{Circuit, InstructionKind};

use crate::statevector::Statevector;

/// Local statevector oracle.
///
/// Measurements are deferred to the end of the circuit: a gate that touches
/// a qubit after it was measured is rejected rather than simulated with the
/// wrong semantics.
#[derive(Debug, Clone)]
pub struct SimulatorBackend {
    name: String,
    max_qubits: usize,
}

impl SimulatorBackend {
    /// Create a new simulator backend with default settings.
    pub fn new() -> Self {
        Self::with_max_qubits(20)
    }

    /// Create a simulator with custom max qubits.
    pub fn with_max_qubits(max_qubits: usize) -> Self {
        Self {
            name: "statevector".into(),
            max_qubits,
        }
    }

    /// Evolve the state and return the basis-state probabilities together
    /// with the clbit → qubit readout map.
    fn evolve(&self, circuit: &Circuit) -> HalResult<(Vec<f64>, Vec<Option<usize>>)> {
        let mut sv = Statevector::new(circuit.num_qubits());
        let mut readout: Vec<Option<usize>> = vec![None; circuit.num_clbits()];
        let mut measured = vec![false; circuit.num_qubits()];

        for inst in circuit.instructions() {
            let qubits: Vec<usize> = inst.qubits.iter().map(|q| q.index()).collect();
            match &inst.kind {
                InstructionKind::Gate(gate) => {
                    if let Some(q) = qubits.iter().find(|q| measured[**q]) {
                        return Err(HalError::Unsupported(format!(
                            "gate '{}' acts on q{q} after it was measured",
                            gate.name()
                        )));
                    }
                    sv.apply_gate(&gate.kind, &qubits)?;
                }
                InstructionKind::Measure => {
                    for (q, c) in qubits.iter().zip(&inst.clbits) {
                        measured[*q] = true;
                        readout[c.index()] = Some(*q);
                    }
                }
                InstructionKind::Barrier => {}
            }
        }

        Ok((sv.probabilities(), readout))
    }

    /// Render a basis state as a classical bitstring, clbit 0 leftmost.
    /// Classical bits that were never written read as `0`.
    fn bitstring(basis: usize, readout: &[Option<usize>]) -> String {
        readout
            .iter()
            .map(|q| match q {
                Some(q) if basis & (1 << q) != 0 => '1',
                _ => '0',
            })
            .collect()
    }
}

impl Default for SimulatorBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Oracle for SimulatorBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn max_qubits(&self) -> usize {
        self.max_qubits
    }

    #[instrument(skip(self, circuit), fields(circuit = circuit.name(), qubits = circuit.num_qubits()))]
    fn execute(
        &self,
        circuit: &Circuit,
        shots: u32,
        seed: Option<u64>,
    ) -> HalResult<OutcomeDistribution> {
        if shots == 0 {
            return Err(HalError::InvalidShots { shots });
        }
        if circuit.num_qubits() > self.max_qubits {
            return Err(HalError::CircuitTooLarge {
                oracle: self.name.clone(),
                required: circuit.num_qubits(),
                available: self.max_qubits,
            });
        }
        if !circuit.has_measurements() {
            return Err(HalError::InvalidCircuit(format!(
                "circuit '{}' has no measurements",
                circuit.name()
            )));
        }

        let start = Instant::now();
        let (probabilities, readout) = self.evolve(circuit)?;

        let mut cumulative = Vec::with_capacity(probabilities.len());
        let mut running = 0.0;
        for p in &probabilities {
            running += p;
            cumulative.push(running);
        }

        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };

        let last = cumulative.len() - 1;
        let mut hits: FxHashMap<usize, u64> = FxHashMap::default();
        for _ in 0..shots {
            // Scale by the accumulated norm so rounding never leaves a gap at the top.
            let r: f64 = rng.r#gen::<f64>() * running;
            let basis = cumulative.partition_point(|c| *c <= r).min(last);
            *hits.entry(basis).or_insert(0) += 1;
        }

        let mut counts = OutcomeDistribution::new();
        for (basis, n) in hits {
            counts.add(&Self::bitstring(basis, &readout), n as f64);
        }

        debug!(
            shots,
            outcomes = counts.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "simulation completed"
        );
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qfault_ir::{ClbitId, QubitId};

    #[test]
    fn test_simulator_bell_state() {
        let backend = SimulatorBackend::new();
        let counts = backend.execute(&Circuit::bell().unwrap(), 1000, None).unwrap();

        assert_eq!(counts.total(), 1000.0);
        assert_eq!(counts.get("00") + counts.get("11"), 1000.0);
        assert_eq!(counts.get("01") + counts.get("10"), 0.0);
    }

    #[test]
    fn test_seeded_runs_are_identical() {
        let backend = SimulatorBackend::new();
        let mut circuit = Circuit::with_size("h", 1, 1);
        circuit.h(QubitId(0)).unwrap().measure(QubitId(0), ClbitId(0)).unwrap();

        let a = backend.execute(&circuit, 500, Some(11)).unwrap();
        let b = backend.execute(&circuit, 500, Some(11)).unwrap();
        assert_eq!(a, b);
        assert!(a.get("0") > 0.0 && a.get("1") > 0.0);
    }

    #[test]
    fn test_bitstring_puts_clbit_zero_first() {
        let backend = SimulatorBackend::new();
        let mut circuit = Circuit::with_size("x0", 2, 2);
        circuit.x(QubitId(0)).unwrap().measure_all().unwrap();

        let counts = backend.execute(&circuit, 10, Some(1)).unwrap();
        assert_eq!(counts.get("10"), 10.0);
    }

    #[test]
    fn test_readout_follows_clbit_mapping() {
        let backend = SimulatorBackend::new();
        let mut circuit = Circuit::with_size("swap_readout", 2, 2);
        circuit
            .x(QubitId(0))
            .unwrap()
            .measure(QubitId(0), ClbitId(1))
            .unwrap()
            .measure(QubitId(1), ClbitId(0))
            .unwrap();

        let counts = backend.execute(&circuit, 10, Some(1)).unwrap();
        assert_eq!(counts.get("01"), 10.0);
    }

    #[test]
    fn test_rejects_zero_shots() {
        let backend = SimulatorBackend::new();
        let result = backend.execute(&Circuit::bell().unwrap(), 0, None);
        assert!(matches!(result, Err(HalError::InvalidShots { shots: 0 })));
    }

    #[test]
    fn test_rejects_unmeasured_circuit() {
        let backend = SimulatorBackend::new();
        let mut circuit = Circuit::with_size("bare", 1, 0);
        circuit.x(QubitId(0)).unwrap();
        let result = backend.execute(&circuit, 10, None);
        assert!(matches!(result, Err(HalError::InvalidCircuit(_))));
    }

    #[test]
    fn test_rejects_gate_after_measurement() {
        let backend = SimulatorBackend::new();
        let mut circuit = Circuit::with_size("mid", 1, 1);
        circuit
            .measure(QubitId(0), ClbitId(0))
            .unwrap()
            .x(QubitId(0))
            .unwrap();
        let result = backend.execute(&circuit, 10, None);
        assert!(matches!(result, Err(HalError::Unsupported(_))));
    }

    #[test]
    fn test_simulator_too_many_qubits() {
        let backend = SimulatorBackend::with_max_qubits(5);
        let mut circuit = Circuit::with_size("wide", 10, 0);
        circuit.measure_all().unwrap();
        let result = backend.execute(&circuit, 100, None);
        assert!(matches!(result, Err(HalError::CircuitTooLarge {
                required: 10,
                available: 5,
                ..
            })));
    }
}
