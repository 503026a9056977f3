//! Operations placed on qubits and classical bits.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::gate::{Gate, StandardGate};
use crate::qubit::{ClbitId, QubitId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InstructionKind {
    Gate(Gate),
    /// `qubits[i]` is read out into `clbits[i]`.
    Measure,
    /// Ordering marker; leaves the state alone.
    Barrier,
}

/// One operation of a circuit. Operand order is significant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub kind: InstructionKind,
    pub qubits: Vec<QubitId>,
    pub clbits: Vec<ClbitId>,
}

impl Instruction {
    pub fn gate(gate: impl Into<Gate>, qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self {
            kind: InstructionKind::Gate(gate.into()),
            qubits: qubits.into_iter().collect(),
            clbits: vec![],
        }
    }

    pub fn single_qubit_gate(gate: StandardGate, qubit: QubitId) -> Self {
        Self::gate(gate, [qubit])
    }

    /// `first` is the control for controlled gates.
    pub fn two_qubit_gate(gate: StandardGate, first: QubitId, second: QubitId) -> Self {
        Self::gate(gate, [first, second])
    }

    pub fn measure(qubit: QubitId, clbit: ClbitId) -> Self {
        Self {
            kind: InstructionKind::Measure,
            qubits: vec![qubit],
            clbits: vec![clbit],
        }
    }

    pub fn barrier(qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self {
            kind: InstructionKind::Barrier,
            qubits: qubits.into_iter().collect(),
            clbits: vec![],
        }
    }

    /// Attach classical targets, replacing any existing ones.
    #[must_use]
    pub fn with_clbits(mut self, clbits: impl IntoIterator<Item = ClbitId>) -> Self {
        self.clbits = clbits.into_iter().collect();
        self
    }

    pub fn is_gate(&self) -> bool {
        matches!(self.kind, InstructionKind::Gate(_))
    }

    pub fn is_measure(&self) -> bool {
        matches!(self.kind, InstructionKind::Measure)
    }

    pub fn is_barrier(&self) -> bool {
        matches!(self.kind, InstructionKind::Barrier)
    }

    pub fn as_gate(&self) -> Option<&Gate> {
        if let InstructionKind::Gate(gate) = &self.kind {
            Some(gate)
        } else {
            None
        }
    }

    /// Gate mnemonic, or `"measure"` / `"barrier"`.
    pub fn name(&self) -> &str {
        match &self.kind {
            InstructionKind::Gate(gate) => gate.name(),
            InstructionKind::Measure => "measure",
            InstructionKind::Barrier => "barrier",
        }
    }

    /// Structural equivalence used for fault matching: the kind name is
    /// equal and the ordered qubit list is identical. `[0, 1]` does not
    /// match `[1, 0]`.
    pub fn matches(&self, name: &str, qubits: &[QubitId]) -> bool {
        self.name() == name && self.qubits == qubits
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            InstructionKind::Gate(g) => write!(f, "{g}")?,
            _ => write!(f, "{}", self.name())?,
        }
        let qs: Vec<String> = self.qubits.iter().map(ToString::to_string).collect();
        write!(f, " {}", qs.join(", "))?;
        if !self.clbits.is_empty() {
            let cs: Vec<String> = self.clbits.iter().map(ToString::to_string).collect();
            write!(f, " -> {}", cs.join(", "))?;
        }
        Ok(())
    }
}
