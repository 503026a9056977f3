//! Quantum gate kinds.
//!
//! A gate's kind carries both its semantic type and its parameters, so
//! `Rz(0.3)` and `Rz(0.4)` are different kinds that share the name `"rz"`.
//! Fault matching compares names, never parameters.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{IrError, IrResult};

/// Built-in gates. Angles are radians and belong to the kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StandardGate {
    I,
    X,
    Y,
    Z,
    H,
    /// Phase by π/2.
    S,
    Sdg,
    /// Phase by π/4.
    T,
    Tdg,
    /// Square root of X.
    SX,
    SXdg,
    Rx(f64),
    Ry(f64),
    Rz(f64),
    /// diag(1, e^{iλ}).
    P(f64),
    /// U(θ, φ, λ), the general single-qubit rotation.
    U(f64, f64, f64),
    /// Operands are (control, target).
    CX,
    CY,
    CZ,
    Swap,
    CRz(f64),
    CP(f64),
    /// Operands are (control, control, target).
    CCX,
}

impl StandardGate {
    /// Lower-case mnemonic used for matching and display.
    #[inline]
    pub fn name(&self) -> &'static str {
        use StandardGate::*;
        match self {
            I => "id",
            X => "x",
            Y => "y",
            Z => "z",
            H => "h",
            S => "s",
            Sdg => "sdg",
            T => "t",
            Tdg => "tdg",
            SX => "sx",
            SXdg => "sxdg",
            Rx(_) => "rx",
            Ry(_) => "ry",
            Rz(_) => "rz",
            P(_) => "p",
            U(..) => "u",
            CX => "cx",
            CY => "cy",
            CZ => "cz",
            Swap => "swap",
            CRz(_) => "crz",
            CP(_) => "cp",
            CCX => "ccx",
        }
    }

    /// Arity.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        use StandardGate::*;
        if matches!(self, CCX) {
            3
        } else if matches!(self, CX | CY | CZ | Swap | CRz(_) | CP(_)) {
            2
        } else {
            1
        }
    }

    /// Angles carried by the kind, in declaration order.
    pub fn parameters(&self) -> Vec<f64> {
        use StandardGate::*;
        match *self {
            Rx(a) | Ry(a) | Rz(a) | P(a) | CRz(a) | CP(a) => vec![a],
            U(theta, phi, lambda) => vec![theta, phi, lambda],
            _ => Vec::new(),
        }
    }
}

/// A user-defined gate, optionally backed by an explicit unitary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomGate {
    pub name: String,
    pub num_qubits: u32,
    /// Unitary matrix (row-major, 2^n × 2^n). Local qubit 0 is the
    /// least-significant bit of the row/column index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matrix: Option<Vec<Complex64>>,
}

impl CustomGate {
    /// An opaque gate. Oracles that need its action will reject it.
    pub fn new(name: impl Into<String>, num_qubits: u32) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            matrix: None,
        }
    }

    /// Attach a unitary matrix, checking that it is `(2^n)^2` entries long.
    pub fn with_matrix(mut self, matrix: Vec<Complex64>) -> IrResult<Self> {
        let dim = 1usize << self.num_qubits;
        if matrix.len() != dim * dim {
            return Err(IrError::MatrixDimension {
                gate_name: self.name,
                expected: dim * dim,
                got: matrix.len(),
            });
        }
        self.matrix = Some(matrix);
        Ok(self)
    }
}

/// What a gate does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GateKind {
    Standard(StandardGate),
    Custom(CustomGate),
}

impl GateKind {
    #[inline]
    pub fn name(&self) -> &str {
        match self {
            Self::Standard(standard) => standard.name(),
            Self::Custom(custom) => custom.name.as_str(),
        }
    }

    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            Self::Standard(standard) => standard.num_qubits(),
            Self::Custom(custom) => custom.num_qubits,
        }
    }
}

/// A gate with an optional diagnostic label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    pub kind: GateKind,
    /// Optional label, e.g. the fault that produced this gate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Gate {
    fn unlabeled(kind: GateKind) -> Self {
        Self { kind, label: None }
    }

    pub fn standard(standard: StandardGate) -> Self {
        Self::unlabeled(GateKind::Standard(standard))
    }

    pub fn custom(custom: CustomGate) -> Self {
        Self::unlabeled(GateKind::Custom(custom))
    }

    #[must_use]
    pub fn with_label(self, label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..self
        }
    }

    /// Matching key: the kind's mnemonic, parameters excluded.
    pub fn name(&self) -> &str {
        self.kind.name()
    }

    pub fn num_qubits(&self) -> u32 {
        self.kind.num_qubits()
    }
}

impl From<StandardGate> for Gate {
    fn from(standard: StandardGate) -> Self {
        Self::standard(standard)
    }
}

impl From<CustomGate> for Gate {
    fn from(custom: CustomGate) -> Self {
        Self::custom(custom)
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            GateKind::Standard(g) => {
                let params = g.parameters();
                if params.is_empty() {
                    write!(f, "{}", g.name())
                } else {
                    let rendered: Vec<String> = params.iter().map(|p| format!("{p}")).collect();
                    write!(f, "{}({})", g.name(), rendered.join(", "))
                }
            }
            GateKind::Custom(g) => write!(f, "{}", g.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_arity_and_parameters() {
        assert_eq!(StandardGate::SX.num_qubits(), 1);
        assert_eq!(StandardGate::CP(0.2).num_qubits(), 2);
        assert_eq!(StandardGate::CCX.num_qubits(), 3);
        assert_eq!(StandardGate::U(1.0, 2.0, 3.0).parameters(), vec![1.0, 2.0, 3.0]);
        assert!(StandardGate::Swap.parameters().is_empty());
        assert_eq!(StandardGate::Rz(PI).parameters(), vec![PI]);
    }

    #[test]
    fn test_name_ignores_parameters() {
        assert_eq!(StandardGate::Rz(0.1).name(), StandardGate::Rz(0.2).name());
        assert_ne!(StandardGate::Rz(0.1), StandardGate::Rz(0.2));
    }

    #[test]
    fn test_custom_gate_matrix_dimension() {
        let one = Complex64::new(1.0, 0.0);
        let zero = Complex64::new(0.0, 0.0);
        let ok = CustomGate::new("ident", 1).with_matrix(vec![one, zero, zero, one]);
        assert!(ok.is_ok());

        let bad = CustomGate::new("bad", 2).with_matrix(vec![one, zero, zero, one]);
        assert!(matches!(
            bad,
            Err(IrError::MatrixDimension {
                expected: 16,
                got: 4,
                ..
            })
        ));
    }

    #[test]
    fn test_gate_display() {
        assert_eq!(Gate::standard(StandardGate::X).to_string(), "x");
        assert_eq!(Gate::standard(StandardGate::Rx(0.5)).to_string(), "rx(0.5)");
        let labeled = Gate::standard(StandardGate::H).with_label("fault");
        assert_eq!(labeled.label.as_deref(), Some("fault"));
    }
}
