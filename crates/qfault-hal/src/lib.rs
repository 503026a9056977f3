//! qfault Hardware Abstraction Layer
//!
//! The boundary between the fault-detection core and whatever produces
//! measurement samples.
//!
//! - [`Oracle`]: the simulator oracle contract, `execute(circuit, shots, seed)`
//! - [`OutcomeDistribution`]: bitstring → frequency, as counts or probabilities
//! - [`aligned_keys`] / [`aligned_vector`]: the union-of-keys alignment used by
//!   every statistical comparison
//!
//! # Implementing an Oracle
//!
//! ```rust
//! use qfault_hal::{HalResult, Oracle, OutcomeDistribution};
//! use qfault_ir::Circuit;
//!
//! /// Always reports the all-zeros outcome.
//! struct ZeroOracle;
//!
//! impl Oracle for ZeroOracle {
//!     fn name(&self) -> &str {
//!         "zero"
//!     }
//!
//!     fn max_qubits(&self) -> usize {
//!         64
//!     }
//!
//!     fn execute(&self, circuit: &Circuit, shots: u32, _seed: Option<u64>) -> HalResult<OutcomeDistribution> {
//!         let key = "0".repeat(circuit.num_clbits());
//!         Ok(OutcomeDistribution::from_counts([(key, u64::from(shots))]))
//!     }
//! }
//!
//! let counts = ZeroOracle.execute(&Circuit::with_size("c", 2, 2), 10, None).unwrap();
//! assert_eq!(counts.get("00"), 10.0);
//! ```

pub mod distribution;
pub mod error;
pub mod oracle;

pub use distribution::{OutcomeDistribution, aligned_keys, aligned_vector};
pub use error::{HalError, HalResult};
pub use oracle::Oracle;
