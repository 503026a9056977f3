//! qfault Circuit Representation
//!
//! Core data structures shared by the fault injector, the simulator adapter
//! and the detectors.
//!
//! # Overview
//!
//! A [`Circuit`] is an ordered sequence of [`Instruction`]s over a fixed
//! number of qubits and classical bits. Instructions carry a [`Gate`] (a
//! [`StandardGate`] or a [`CustomGate`] with an explicit unitary), a
//! measurement, or a barrier, together with their ordered qubit operands.
//!
//! Circuits are values: rewriting one produces a new circuit through
//! [`Circuit::with_instructions`], so the nominal circuit handed to a
//! detector is never mutated.
//!
//! # Example
//!
//! ```rust
//! use qfault_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::with_size("bell", 2, 0);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//! circuit.measure_all().unwrap();
//!
//! assert_eq!(circuit.num_clbits(), 2);
//! assert!(circuit.is_fully_measured());
//! ```

pub mod circuit;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod qubit;

pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use gate::{CustomGate, Gate, GateKind, StandardGate};
pub use instruction::{Instruction, InstructionKind};
pub use qubit::{ClbitId, QubitId, qubits};
