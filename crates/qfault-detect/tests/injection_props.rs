//! Property-based tests for fault injection.
//!
//! - Injecting no fault reproduces the circuit exactly.
//! - A fault that matches exactly one instruction replaces that instruction
//!   and leaves every other one in place and in order.
//! - A replacement of the wrong width is always rejected.

use proptest::prelude::*;

use qfault_detect::{FaultError, FaultInjector, FaultModel, FaultyBehavior};
use qfault_ir::{Circuit, Gate, Instruction, QubitId, StandardGate};

/// Gate operations drawn for random circuits.
#[derive(Debug, Clone)]
enum GateOp {
    H(u32),
    X(u32),
    Rz(f64, u32),
    CX(u32, u32),
}

fn arb_gate_op(num_qubits: u32) -> impl Strategy<Value = GateOp> {
    let q = 0..num_qubits;
    let single = prop_oneof![
        q.clone().prop_map(GateOp::H),
        q.clone().prop_map(GateOp::X),
        (-3.0_f64..3.0, q.clone()).prop_map(|(a, q)| GateOp::Rz(a, q)),
    ];
    if num_qubits < 2 {
        return single.boxed();
    }
    prop_oneof![
        3 => single,
        1 => (q.clone(), q)
            .prop_filter("distinct operands", |(a, b)| a != b)
            .prop_map(|(a, b)| GateOp::CX(a, b)),
    ]
    .boxed()
}

fn arb_circuit() -> impl Strategy<Value = Circuit> {
    (1_u32..=4).prop_flat_map(|n| {
        prop::collection::vec(arb_gate_op(n), 0..=12).prop_map(move |ops| {
            let mut circuit = Circuit::with_size("prop", n, 0);
            for op in ops {
                let result = match op {
                    GateOp::H(q) => circuit.h(QubitId(q)),
                    GateOp::X(q) => circuit.x(QubitId(q)),
                    GateOp::Rz(a, q) => circuit.rz(a, QubitId(q)),
                    GateOp::CX(c, t) => circuit.cx(QubitId(c), QubitId(t)),
                };
                result.unwrap();
            }
            circuit
        })
    })
}

/// Replaces `y` on one qubit with `z`, or with a gate of the wrong width.
struct YFault {
    qubits: Vec<QubitId>,
    replacement: Gate,
}

impl FaultModel for YFault {
    fn target_qubits(&self) -> &[QubitId] {
        &self.qubits
    }

    fn description(&self) -> &str {
        "y fault"
    }

    fn original_gate(&self) -> Gate {
        StandardGate::Y.into()
    }

    fn faulty_behavior(&self, _matched: &Instruction) -> FaultyBehavior {
        FaultyBehavior::Gate(self.replacement.clone())
    }
}

proptest! {
    #[test]
    fn injection_without_fault_is_identity(circuit in arb_circuit()) {
        let copy = FaultInjector::inject(&circuit, None).unwrap();
        prop_assert_eq!(copy, circuit);
    }

    #[test]
    fn single_match_is_substituted_in_place(
        circuit in arb_circuit(),
        position in any::<prop::sample::Index>(),
    ) {
        // The random gate set never emits `y`, so the inserted one is the only match.
        let target = QubitId(0);
        let at = position.index(circuit.num_ops() + 1);
        let mut instructions = circuit.instructions().to_vec();
        instructions.insert(at, Instruction::single_qubit_gate(StandardGate::Y, target));
        let nominal = circuit.with_instructions(instructions).unwrap();

        let fault = YFault { qubits: vec![target], replacement: StandardGate::Z.into() };
        let faulty = FaultInjector::inject(&nominal, Some(&fault)).unwrap();

        prop_assert_eq!(faulty.num_ops(), nominal.num_ops());
        for (i, (before, after)) in nominal.instructions().iter().zip(faulty.instructions()).enumerate() {
            if i == at {
                prop_assert_eq!(after.name(), "z");
                prop_assert_eq!(&after.qubits, &before.qubits);
            } else {
                prop_assert_eq!(after, before);
            }
        }
    }

    #[test]
    fn wrong_width_replacement_is_rejected(circuit in arb_circuit()) {
        let mut instructions = circuit.instructions().to_vec();
        instructions.push(Instruction::single_qubit_gate(StandardGate::Y, QubitId(0)));
        let nominal = circuit.with_instructions(instructions).unwrap();

        let fault = YFault { qubits: vec![QubitId(0)], replacement: StandardGate::CCX.into() };
        let result = FaultInjector::inject(&nominal, Some(&fault));
        let is_unsupported = matches!(result, Err(FaultError::UnsupportedFaultReplacement { .. }));
        prop_assert!(is_unsupported);
    }
}
