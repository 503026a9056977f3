//! Built-in fault models.
//!
//! | Model | Matches | Replacement |
//! |-------|---------|-------------|
//! | [`SxPhaseFault`] | `sx q` | `sx`, then `rz(π/20)` |
//! | [`RzOverRotationFault`] | `rz q` | `rz(θ)`, then `ry(θ/10)` |
//! | [`CxRxCrosstalkFault`] | `cx c, t` | `rx(π/10) c`, `cx c, t`, `rx(-π/10) c` |
//! | [`AppendedRotationFault`] | any gate | the gate, then a rotation on each qubit |
//! | [`UnitaryFault`] | any gate | an opaque unitary |
//!
//! Replacements are built once at construction and cloned per match.

use num_complex::Complex64;
use std::f64::consts::PI;

use qfault_ir::{Circuit, CustomGate, Gate, Instruction, QubitId, StandardGate};

use crate::error::FaultResult;
use crate::fault::{FaultModel, FaultyBehavior};

fn local_circuit(
    name: &str,
    num_qubits: u32,
    instructions: impl IntoIterator<Item = Instruction>,
) -> FaultResult<Circuit> {
    Ok(Circuit::with_size(name, num_qubits, 0).with_instructions(instructions)?)
}

// =============================================================================
// Phase error on SX
// =============================================================================

/// An `sx` gate that leaves a spurious `rz(π/20)` behind.
#[derive(Debug, Clone)]
pub struct SxPhaseFault {
    qubits: Vec<QubitId>,
    description: String,
    replacement: Circuit,
}

impl SxPhaseFault {
    /// Extra phase picked up after every `sx`.
    pub const PHASE: f64 = PI / 20.0;

    /// Fault on the `sx` gate acting on `qubit`.
    pub fn new(qubit: QubitId) -> FaultResult<Self> {
        let q = QubitId(0);
        let replacement = local_circuit(
            "sx_phase",
            1,
            [
                Instruction::single_qubit_gate(StandardGate::SX, q),
                Instruction::single_qubit_gate(StandardGate::Rz(Self::PHASE), q),
            ],
        )?;
        Ok(Self {
            qubits: vec![qubit],
            description: format!("sx on {qubit} followed by rz(pi/20)"),
            replacement,
        })
    }
}

impl FaultModel for SxPhaseFault {
    fn target_qubits(&self) -> &[QubitId] {
        &self.qubits
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn original_gate(&self) -> Gate {
        StandardGate::SX.into()
    }

    fn faulty_behavior(&self, _matched: &Instruction) -> FaultyBehavior {
        FaultyBehavior::Circuit(self.replacement.clone())
    }
}

// =============================================================================
// Over-rotation on RZ
// =============================================================================

/// An `rz(θ)` that also tips the state by `ry(θ/10)`.
///
/// The replacement always uses the model's own `θ`, so a matched `rz` with a
/// different angle is rewritten to `rz(θ)`.
#[derive(Debug, Clone)]
pub struct RzOverRotationFault {
    theta: f64,
    qubits: Vec<QubitId>,
    description: String,
    replacement: Circuit,
}

impl RzOverRotationFault {
    /// Fault on `rz(theta)` acting on `qubit`.
    pub fn new(theta: f64, qubit: QubitId) -> FaultResult<Self> {
        let q = QubitId(0);
        let replacement = local_circuit(
            "rz_over_rotation",
            1,
            [
                Instruction::single_qubit_gate(StandardGate::Rz(theta), q),
                Instruction::single_qubit_gate(StandardGate::Ry(0.1 * theta), q),
            ],
        )?;
        Ok(Self {
            theta,
            qubits: vec![qubit],
            description: format!("rz({theta}) on {qubit} with ry({}) leakage", 0.1 * theta),
            replacement,
        })
    }

    /// Rotation angle of the faulty gate.
    pub fn theta(&self) -> f64 {
        self.theta
    }
}

impl FaultModel for RzOverRotationFault {
    fn target_qubits(&self) -> &[QubitId] {
        &self.qubits
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn original_gate(&self) -> Gate {
        StandardGate::Rz(self.theta).into()
    }

    fn faulty_behavior(&self, _matched: &Instruction) -> FaultyBehavior {
        FaultyBehavior::Circuit(self.replacement.clone())
    }
}

// =============================================================================
// Crosstalk on CX
// =============================================================================

/// A `cx` whose control is rotated by `rx(π/10)` before and `rx(-π/10)` after.
#[derive(Debug, Clone)]
pub struct CxRxCrosstalkFault {
    qubits: Vec<QubitId>,
    description: String,
    replacement: Circuit,
}

impl CxRxCrosstalkFault {
    /// Control-line rotation wrapped around the `cx`.
    pub const ANGLE: f64 = 0.1 * PI;

    /// Fault on `cx control, target`.
    pub fn new(control: QubitId, target: QubitId) -> FaultResult<Self> {
        let (c, t) = (QubitId(0), QubitId(1));
        let replacement = local_circuit(
            "cx_crosstalk",
            2,
            [
                Instruction::single_qubit_gate(StandardGate::Rx(Self::ANGLE), c),
                Instruction::two_qubit_gate(StandardGate::CX, c, t),
                Instruction::single_qubit_gate(StandardGate::Rx(-Self::ANGLE), c),
            ],
        )?;
        Ok(Self {
            qubits: vec![control, target],
            description: format!("cx {control}, {target} with rx crosstalk on the control"),
            replacement,
        })
    }
}

impl FaultModel for CxRxCrosstalkFault {
    fn target_qubits(&self) -> &[QubitId] {
        &self.qubits
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn original_gate(&self) -> Gate {
        StandardGate::CX.into()
    }

    fn faulty_behavior(&self, _matched: &Instruction) -> FaultyBehavior {
        FaultyBehavior::Circuit(self.replacement.clone())
    }
}

// =============================================================================
// Generic appended rotation
// =============================================================================

/// Rotation axis for [`AppendedRotationFault`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationAxis {
    X,
    Y,
    Z,
}

impl RotationAxis {
    /// The rotation gate about this axis.
    pub fn gate(self, angle: f64) -> StandardGate {
        match self {
            RotationAxis::X => StandardGate::Rx(angle),
            RotationAxis::Y => StandardGate::Ry(angle),
            RotationAxis::Z => StandardGate::Rz(angle),
        }
    }
}

/// Any gate followed by a small rotation on each of its qubits.
///
/// Scaling `angle` gives a family of faults of increasing strength.
#[derive(Debug, Clone)]
pub struct AppendedRotationFault {
    gate: Gate,
    qubits: Vec<QubitId>,
    description: String,
    replacement: Circuit,
}

impl AppendedRotationFault {
    /// Fault on `gate` at `qubits`, appending `axis` rotations by `angle`.
    pub fn new(
        gate: impl Into<Gate>,
        qubits: Vec<QubitId>,
        axis: RotationAxis,
        angle: f64,
    ) -> FaultResult<Self> {
        let gate = gate.into();
        let width = gate.num_qubits();
        let local: Vec<QubitId> = (0..width).map(QubitId).collect();

        let mut instructions = vec![Instruction::gate(gate.clone(), local.iter().copied())];
        instructions.extend(
            local
                .iter()
                .map(|q| Instruction::single_qubit_gate(axis.gate(angle), *q)),
        );
        let replacement = local_circuit("appended_rotation", width, instructions)?;

        let description = format!(
            "{gate} on [{}] followed by {}({angle})",
            qubits
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
            axis.gate(angle).name(),
        );
        Ok(Self {
            gate,
            qubits,
            description,
            replacement,
        })
    }
}

impl FaultModel for AppendedRotationFault {
    fn target_qubits(&self) -> &[QubitId] {
        &self.qubits
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn original_gate(&self) -> Gate {
        self.gate.clone()
    }

    fn faulty_behavior(&self, _matched: &Instruction) -> FaultyBehavior {
        FaultyBehavior::Circuit(self.replacement.clone())
    }
}

// =============================================================================
// Opaque unitary replacement
// =============================================================================

/// Replaces a gate by an arbitrary unitary.
#[derive(Debug, Clone)]
pub struct UnitaryFault {
    gate: Gate,
    qubits: Vec<QubitId>,
    description: String,
    replacement: Gate,
}

impl UnitaryFault {
    /// Fault on `gate` at `qubits` that runs `matrix` instead.
    ///
    /// `matrix` is row-major with local qubit 0 as the least-significant
    /// index bit, and must be `(2^n)^2` entries long for an `n`-qubit gate.
    pub fn new(
        gate: impl Into<Gate>,
        qubits: Vec<QubitId>,
        matrix: Vec<Complex64>,
    ) -> FaultResult<Self> {
        let gate = gate.into();
        let custom = CustomGate::new(format!("{}_faulty", gate.name()), gate.num_qubits())
            .with_matrix(matrix)?;
        Ok(Self {
            description: format!("{gate} replaced by unitary '{}'", custom.name),
            gate,
            qubits,
            replacement: Gate::custom(custom),
        })
    }
}

impl FaultModel for UnitaryFault {
    fn target_qubits(&self) -> &[QubitId] {
        &self.qubits
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn original_gate(&self) -> Gate {
        self.gate.clone()
    }

    fn faulty_behavior(&self, _matched: &Instruction) -> FaultyBehavior {
        FaultyBehavior::Gate(self.replacement.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qfault_ir::{GateKind, InstructionKind};

    fn probe(gate: StandardGate, qubits: &[u32]) -> Instruction {
        Instruction::gate(gate, qubits.iter().map(|q| QubitId(*q)))
    }

    fn replacement_names(behavior: FaultyBehavior) -> Vec<String> {
        match behavior {
            FaultyBehavior::Circuit(c) => c
                .instructions()
                .iter()
                .map(|i| i.name().to_string())
                .collect(),
            FaultyBehavior::Gate(g) => vec![g.name().to_string()],
            FaultyBehavior::Instruction(i) => vec![i.name().to_string()],
        }
    }

    #[test]
    fn test_sx_phase_fault() {
        let fault = SxPhaseFault::new(QubitId(0)).unwrap();
        assert_eq!(fault.target_kind(), "sx");
        assert_eq!(fault.target_qubits(), &[QubitId(0)]);

        let behavior = fault.faulty_behavior(&probe(StandardGate::SX, &[0]));
        assert_eq!(replacement_names(behavior), vec!["sx", "rz"]);
    }

    #[test]
    fn test_rz_over_rotation_scales_with_theta() {
        let fault = RzOverRotationFault::new(0.8, QubitId(2)).unwrap();
        assert_eq!(fault.target_kind(), "rz");
        assert_eq!(fault.theta(), 0.8);

        let FaultyBehavior::Circuit(c) = fault.faulty_behavior(&probe(StandardGate::Rz(0.8), &[2]))
        else {
            panic!("expected a sub-circuit");
        };
        let InstructionKind::Gate(leak) = &c.instructions()[1].kind else {
            panic!("expected a gate");
        };
        assert_eq!(leak.kind, GateKind::Standard(StandardGate::Ry(0.1 * 0.8)));
    }

    #[test]
    fn test_cx_crosstalk_is_two_qubit() {
        let fault = CxRxCrosstalkFault::new(QubitId(1), QubitId(0)).unwrap();
        assert_eq!(fault.target_qubits(), &[QubitId(1), QubitId(0)]);

        let FaultyBehavior::Circuit(c) = fault.faulty_behavior(&probe(StandardGate::CX, &[1, 0]))
        else {
            panic!("expected a sub-circuit");
        };
        assert_eq!(c.num_qubits(), 2);
        assert_eq!(c.num_ops(), 3);
        assert_eq!(c.instructions()[1].qubits, vec![QubitId(0), QubitId(1)]);
    }

    #[test]
    fn test_appended_rotation_on_every_qubit() {
        let fault = AppendedRotationFault::new(
            StandardGate::CZ,
            vec![QubitId(0), QubitId(1)],
            RotationAxis::Y,
            0.05,
        )
        .unwrap();
        let behavior = fault.faulty_behavior(&probe(StandardGate::CZ, &[0, 1]));
        assert_eq!(replacement_names(behavior), vec!["cz", "ry", "ry"]);
        assert!(fault.description().contains("ry(0.05)"));
    }

    #[test]
    fn test_unitary_fault_checks_dimension() {
        let one = Complex64::new(1.0, 0.0);
        let zero = Complex64::new(0.0, 0.0);

        let fault =
            UnitaryFault::new(StandardGate::X, vec![QubitId(0)], vec![one, zero, zero, one])
                .unwrap();
        let behavior = fault.faulty_behavior(&probe(StandardGate::X, &[0]));
        assert_eq!(replacement_names(behavior), vec!["x_faulty"]);

        assert!(UnitaryFault::new(StandardGate::X, vec![QubitId(0)], vec![one]).is_err());
    }

    #[test]
    fn test_library_as_trait_objects() {
        let faults: Vec<Box<dyn FaultModel>> = vec![
            Box::new(SxPhaseFault::new(QubitId(0)).unwrap()),
            Box::new(RzOverRotationFault::new(PI / 4.0, QubitId(0)).unwrap()),
            Box::new(CxRxCrosstalkFault::new(QubitId(0), QubitId(1)).unwrap()),
        ];
        let kinds: Vec<String> = faults.iter().map(|f| f.target_kind()).collect();
        assert_eq!(kinds, vec!["sx", "rz", "cx"]);
    }
}
