//! The fault model contract.
//!
//! A [`FaultModel`] names one gate at one ordered list of qubits and says
//! what should run in its place. The [`FaultInjector`](crate::FaultInjector)
//! finds every instruction whose gate name and ordered qubit list match and
//! splices in the model's [`FaultyBehavior`].
//!
//! Qubits inside a replacement are *local*: local qubit `j` is mapped onto
//! the `j`-th qubit of the matched instruction. A two-qubit fault written
//! against `q0, q1` therefore lands on `q3, q1` when it matches `cx q3, q1`.

use qfault_ir::{Circuit, Gate, Instruction, QubitId};

/// What a fault model puts in place of a matched instruction.
#[derive(Debug, Clone)]
pub enum FaultyBehavior {
    /// A single gate placed on the matched qubits. Classical bits of the
    /// matched instruction are kept.
    Gate(Gate),
    /// A purely quantum sub-circuit whose qubit `j` maps onto the `j`-th
    /// matched qubit. Must not contain measurements.
    Circuit(Circuit),
    /// A single gate instruction written against local qubits. Measurements
    /// and barriers are rejected.
    Instruction(Instruction),
}

impl From<Gate> for FaultyBehavior {
    fn from(gate: Gate) -> Self {
        Self::Gate(gate)
    }
}

impl From<Circuit> for FaultyBehavior {
    fn from(circuit: Circuit) -> Self {
        Self::Circuit(circuit)
    }
}

impl From<Instruction> for FaultyBehavior {
    fn from(instruction: Instruction) -> Self {
        Self::Instruction(instruction)
    }
}

/// A defective variant of one gate at specific qubits.
pub trait FaultModel: Send + Sync {
    /// Ordered qubits the fault applies to.
    fn target_qubits(&self) -> &[QubitId];

    /// Free-text label used in logs and errors.
    fn description(&self) -> &str;

    /// The fault-free gate this model stands in for.
    fn original_gate(&self) -> Gate;

    /// The replacement for one matched instruction.
    fn faulty_behavior(&self, matched: &Instruction) -> FaultyBehavior;

    /// Gate name the injector matches against.
    fn target_kind(&self) -> String {
        self.original_gate().name().to_string()
    }
}

impl<F: FaultModel + ?Sized> FaultModel for Box<F> {
    fn target_qubits(&self) -> &[QubitId] {
        (**self).target_qubits()
    }

    fn description(&self) -> &str {
        (**self).description()
    }

    fn original_gate(&self) -> Gate {
        (**self).original_gate()
    }

    fn faulty_behavior(&self, matched: &Instruction) -> FaultyBehavior {
        (**self).faulty_behavior(matched)
    }

    fn target_kind(&self) -> String {
        (**self).target_kind()
    }
}
