//! qfault Local Statevector Oracle
//!
//! A dense statevector implementation of [`qfault_hal::Oracle`] used as the
//! reference simulator for fault-injection and detection.
//!
//! # Features
//!
//! - **All standard gates** from `qfault-ir`, plus custom gates that carry a
//!   unitary matrix (the shape produced by opaque fault models)
//! - **Seedable sampling**: the same circuit, shot count and seed always
//!   return the same counts; unseeded calls draw fresh entropy
//! - **No shared RNG**: every call owns its generator, so one backend can be
//!   used from many threads at once
//!
//! The statevector is evolved once per call and shots are drawn from its
//! Born-rule distribution, so 100k-shot runs cost one simulation plus 100k
//! table lookups.
//!
//! | Qubits | Memory |
//! |--------|--------|
//! | 10 | ~16 KB |
//! | 20 | ~16 MB |
//!
//! # Example
//!
//! ```rust
//! use qfault_adapter_sim::SimulatorBackend;
//! use qfault_hal::Oracle;
//! use qfault_ir::Circuit;
//!
//! let backend = SimulatorBackend::new();
//! let counts = backend.execute(&Circuit::bell().unwrap(), 1000, Some(7)).unwrap();
//! assert_eq!(counts.get("00") + counts.get("11"), 1000.0);
//! ```

mod simulator;
mod statevector;

pub use simulator::SimulatorBackend;
pub use statevector::Statevector;
