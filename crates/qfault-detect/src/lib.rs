//! qfault Fault Injection and Detection
//!
//! Decides whether an observed outcome distribution is consistent with
//! fault-free execution of a quantum circuit.
//!
//! # Overview
//!
//! - [`FaultModel`] describes a defective gate: which gate, on which ordered
//!   qubits, and what runs in its place ([`FaultyBehavior`]).
//! - [`FaultInjector`] rewrites a circuit by substituting every matching
//!   instruction, completes its measurements and samples it on an
//!   [`Oracle`](qfault_hal::Oracle).
//! - [`ChiSquareDetector`] tests the observation against a freshly simulated
//!   reference with a Pearson chi-square test.
//! - [`DivergenceDetector`] compares the KL divergence of the observation
//!   against a bootstrapped threshold of fault-free sampling noise.
//! - [`DetectionCampaign`] repeats detections to estimate overkill and
//!   test-escape rates.
//!
//! Detectors are stateless between calls and may be shared across threads.
//!
//! # Example
//!
//! ```rust
//! use qfault_adapter_sim::SimulatorBackend;
//! use qfault_detect::{ChiSquareConfig, ChiSquareDetector, FaultInjector, SxPhaseFault};
//! use qfault_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::with_size("sx", 1, 0);
//! circuit.sx(QubitId(0)).unwrap();
//!
//! let fault = SxPhaseFault::new(QubitId(0)).unwrap();
//! let backend = SimulatorBackend::new();
//! let observed = FaultInjector::simulate(&backend, &circuit, Some(&fault), 2000, Some(1)).unwrap();
//!
//! let detector = ChiSquareDetector::new(ChiSquareConfig {
//!     shots: 2000,
//!     ..ChiSquareConfig::default()
//! })
//! .with_seed(Some(2));
//! let report = detector.evaluate(&backend, Some(&fault), &circuit, &observed).unwrap();
//! assert!(report.p_value >= 0.0 && report.p_value <= 1.0);
//! ```

pub mod campaign;
pub mod chi_square;
pub mod config;
pub mod divergence;
pub mod error;
pub mod fault;
pub mod faults;
pub mod injector;
pub mod stats;

pub use campaign::{CampaignReport, DetectionCampaign, Detector};
pub use chi_square::{ChiSquareDetector, ChiSquareReport, detect_by_chi_square};
pub use config::{ChiSquareConfig, ConfigError, DetectionConfig, DivergenceConfig};
pub use divergence::{DivergenceDetector, DivergenceReport, detect_by_divergence};
pub use error::{FaultError, FaultResult};
pub use fault::{FaultModel, FaultyBehavior};
pub use faults::{
    AppendedRotationFault, CxRxCrosstalkFault, RotationAxis, RzOverRotationFault, SxPhaseFault,
    UnitaryFault,
};
pub use injector::FaultInjector;
