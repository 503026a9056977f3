//! Fault injection by structural substitution.

use tracing::{debug, instrument};

use qfault_hal::{Oracle, OutcomeDistribution};
use qfault_ir::{Circuit, Instruction, QubitId};

use crate::error::{FaultError, FaultResult};
use crate::fault::{FaultModel, FaultyBehavior};

/// Rewrites circuits according to a [`FaultModel`] and runs them.
///
/// The injector holds no state and introduces no randomness; all
/// stochasticity comes from the oracle and its seed.
#[derive(Debug, Clone, Copy, Default)]
pub struct FaultInjector;

impl FaultInjector {
    /// Replace every instruction matching `fault` by its faulty behavior.
    ///
    /// An instruction matches when its gate name equals the fault's target
    /// kind and its ordered qubit list equals the fault's target qubits.
    /// Without a fault the circuit is returned as an identical copy.
    pub fn inject(circuit: &Circuit, fault: Option<&dyn FaultModel>) -> FaultResult<Circuit> {
        let Some(fault) = fault else {
            return Ok(circuit.clone());
        };

        let kind = fault.target_kind();
        let targets = fault.target_qubits();
        let mut rewritten = Vec::with_capacity(circuit.num_ops());
        let mut matched = 0usize;

        for inst in circuit.instructions() {
            if inst.is_gate() && inst.matches(&kind, targets) {
                matched += 1;
                Self::substitute(fault, inst, &mut rewritten)?;
            } else {
                rewritten.push(inst.clone());
            }
        }

        debug!(
            fault = fault.description(),
            kind = %kind,
            matched,
            ops_before = circuit.num_ops(),
            ops_after = rewritten.len(),
            "fault injected"
        );
        Ok(circuit.with_instructions(rewritten)?)
    }

    /// Inject `fault` and make sure every qubit is measured.
    pub fn prepare(circuit: &Circuit, fault: Option<&dyn FaultModel>) -> FaultResult<Circuit> {
        Self::complete_measurement(Self::inject(circuit, fault)?)
    }

    /// Prepare the circuit and sample it on `oracle`.
    #[instrument(skip(oracle, circuit, fault), fields(circuit = circuit.name(), faulty = fault.is_some()))]
    pub fn simulate<O: Oracle + ?Sized>(
        oracle: &O,
        circuit: &Circuit,
        fault: Option<&dyn FaultModel>,
        shots: u32,
        seed: Option<u64>,
    ) -> FaultResult<OutcomeDistribution> {
        let prepared = Self::prepare(circuit, fault)?;
        Ok(oracle.execute(&prepared, shots, seed)?)
    }

    /// Measure qubit `i` into classical bit `i` for every qubit, unless every
    /// qubit is already measured. Classical bits are added as needed.
    pub fn complete_measurement(mut circuit: Circuit) -> FaultResult<Circuit> {
        if !circuit.is_fully_measured() {
            circuit.measure_all()?;
        }
        Ok(circuit)
    }

    fn substitute(
        fault: &dyn FaultModel,
        matched: &Instruction,
        out: &mut Vec<Instruction>,
    ) -> FaultResult<()> {
        let expected = fault.target_qubits().len();

        match fault.faulty_behavior(matched) {
            FaultyBehavior::Gate(gate) => {
                check_arity(fault, expected, gate.num_qubits() as usize)?;
                out.push(
                    Instruction::gate(gate, matched.qubits.iter().copied())
                        .with_clbits(matched.clbits.iter().copied()),
                );
            }
            FaultyBehavior::Instruction(inst) => {
                if !inst.is_gate() {
                    return Err(FaultError::InvalidFaultyBehavior {
                        fault: fault.description().to_string(),
                        reason: format!("'{}' is not a gate instruction", inst.name()),
                    });
                }
                check_arity(fault, expected, inst.qubits.len())?;
                let qubits = remap(fault, &inst.qubits, &matched.qubits)?;
                out.push(Instruction {
                    kind: inst.kind,
                    qubits,
                    clbits: matched.clbits.clone(),
                });
            }
            FaultyBehavior::Circuit(sub) => {
                check_arity(fault, expected, sub.num_qubits())?;
                if sub.has_measurements() {
                    return Err(FaultError::InvalidFaultyBehavior {
                        fault: fault.description().to_string(),
                        reason: format!("sub-circuit '{}' contains measurements", sub.name()),
                    });
                }
                for inst in sub.instructions() {
                    out.push(Instruction {
                        kind: inst.kind.clone(),
                        qubits: remap(fault, &inst.qubits, &matched.qubits)?,
                        clbits: vec![],
                    });
                }
            }
        }
        Ok(())
    }
}

fn check_arity(fault: &dyn FaultModel, expected: usize, got: usize) -> FaultResult<()> {
    if expected != got {
        return Err(FaultError::UnsupportedFaultReplacement {
            fault: fault.description().to_string(),
            expected,
            got,
        });
    }
    Ok(())
}

/// Map local qubit `j` onto the `j`-th matched qubit.
fn remap(
    fault: &dyn FaultModel,
    local: &[QubitId],
    matched: &[QubitId],
) -> FaultResult<Vec<QubitId>> {
    local
        .iter()
        .map(|q| {
            matched
                .get(q.index())
                .copied()
                .ok_or_else(|| FaultError::InvalidFaultyBehavior {
                    fault: fault.description().to_string(),
                    reason: format!("local qubit {q} has no matched counterpart"),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::faults::{CxRxCrosstalkFault, SxPhaseFault};
    use qfault_ir::{ClbitId, Gate, StandardGate};

    struct Swapped;

    impl FaultModel for Swapped {
        fn target_qubits(&self) -> &[QubitId] {
            &[QubitId(0)]
        }
        fn description(&self) -> &str {
            "x as z"
        }
        fn original_gate(&self) -> Gate {
            StandardGate::X.into()
        }
        fn faulty_behavior(&self, _matched: &Instruction) -> FaultyBehavior {
            FaultyBehavior::Gate(StandardGate::Z.into())
        }
    }

    #[test]
    fn test_inject_without_fault_is_identity() {
        let circuit = Circuit::bell().unwrap();
        let copy = FaultInjector::inject(&circuit, None).unwrap();
        assert_eq!(copy, circuit);
    }

    #[test]
    fn test_gate_replacement_keeps_clbits() {
        let mut circuit = Circuit::with_size("c", 1, 1);
        circuit
            .push(Instruction::single_qubit_gate(StandardGate::X, QubitId(0)).with_clbits([ClbitId(0)]))
            .unwrap();

        let out = FaultInjector::inject(&circuit, Some(&Swapped)).unwrap();
        assert_eq!(out.instructions()[0].name(), "z");
        assert_eq!(out.instructions()[0].clbits, vec![ClbitId(0)]);
    }

    #[test]
    fn test_every_match_is_replaced() {
        let mut circuit = Circuit::with_size("c", 2, 0);
        circuit
            .sx(QubitId(0))
            .unwrap()
            .sx(QubitId(1))
            .unwrap()
            .sx(QubitId(0))
            .unwrap();

        let fault = SxPhaseFault::new(QubitId(0)).unwrap();
        let out = FaultInjector::inject(&circuit, Some(&fault)).unwrap();
        let names: Vec<&str> = out.instructions().iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["sx", "rz", "sx", "sx", "rz"]);
    }

    #[test]
    fn test_qubit_order_matters() {
        let mut circuit = Circuit::with_size("c", 2, 0);
        circuit.cx(QubitId(1), QubitId(0)).unwrap();

        let fault = CxRxCrosstalkFault::new(QubitId(0), QubitId(1)).unwrap();
        let out = FaultInjector::inject(&circuit, Some(&fault)).unwrap();
        assert_eq!(out, circuit);
    }

    #[test]
    fn test_sub_circuit_is_remapped() {
        let mut circuit = Circuit::with_size("c", 3, 0);
        circuit.cx(QubitId(2), QubitId(0)).unwrap();

        let fault = CxRxCrosstalkFault::new(QubitId(2), QubitId(0)).unwrap();
        let out = FaultInjector::inject(&circuit, Some(&fault)).unwrap();
        assert_eq!(out.num_ops(), 3);
        assert_eq!(out.instructions()[0].qubits, vec![QubitId(2)]);
        assert_eq!(out.instructions()[1].qubits, vec![QubitId(2), QubitId(0)]);
    }

    #[test]
    fn test_complete_measurement_is_idempotent() {
        let mut circuit = Circuit::with_size("c", 2, 0);
        circuit.h(QubitId(0)).unwrap();

        let once = FaultInjector::complete_measurement(circuit).unwrap();
        assert_eq!(once.num_clbits(), 2);
        assert!(once.is_fully_measured());

        let twice = FaultInjector::complete_measurement(once.clone()).unwrap();
        assert_eq!(twice, once);
    }
}
