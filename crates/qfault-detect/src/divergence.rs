//! KL-divergence detector with a bootstrapped threshold.
//!
//! The divergence of an observed distribution from a fault-free reference
//! has no closed-form null distribution: it depends on the circuit and the
//! shot count. The detector therefore resamples the fault-free circuit
//! `bootstrap_samples` times, measures how far each resample drifts from the
//! same reference, and flags the observation when it drifts further than
//! the `1 - overkill_bound` quantile of that noise.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, instrument};

use qfault_hal::{Oracle, OutcomeDistribution, aligned_keys, aligned_vector};
use qfault_ir::Circuit;

use crate::chi_square::{check_observed, warn_on_shot_mismatch};
use crate::config::DivergenceConfig;
use crate::error::FaultResult;
use crate::fault::FaultModel;
use crate::injector::FaultInjector;
use crate::stats::{kl_divergence, percentile, stream_seed};

/// Outcome of one divergence detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivergenceReport {
    /// `D(observed ‖ reference)` in nats.
    pub divergence: f64,
    /// Bootstrapped acceptance threshold.
    pub threshold: f64,
    /// `D(resample ‖ reference)` for every fault-free resample, in run order.
    pub bootstrap: Vec<f64>,
    /// `divergence > threshold`.
    pub detected: bool,
}

/// Detects faults by comparing KL divergence against bootstrapped sampling noise.
#[derive(Debug, Clone, Default)]
pub struct DivergenceDetector {
    config: DivergenceConfig,
    seed: Option<u64>,
}

impl DivergenceDetector {
    pub fn new(config: DivergenceConfig) -> Self {
        Self { config, seed: None }
    }

    /// Base seed. The reference run uses it directly and resample `i` uses
    /// [`stream_seed`]`(seed, i)`. `None` draws fresh entropy for every run.
    #[must_use]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn config(&self) -> &DivergenceConfig {
        &self.config
    }

    /// Simulate the reference, bootstrap the threshold and judge `observed`.
    ///
    /// Any oracle failure during the `bootstrap_samples + 1` runs aborts the
    /// whole call.
    #[instrument(skip_all, fields(
        circuit = circuit.name(),
        fault = fault.map(|f| f.description()),
        samples = self.config.bootstrap_samples,
    ))]
    pub fn evaluate<O: Oracle + ?Sized>(
        &self,
        oracle: &O,
        fault: Option<&dyn FaultModel>,
        circuit: &Circuit,
        observed: &OutcomeDistribution,
    ) -> FaultResult<DivergenceReport> {
        self.config.validate()?;
        check_observed(observed)?;
        let start = Instant::now();

        let prepared = FaultInjector::prepare(circuit, None)?;
        let reference = oracle.execute(&prepared, self.config.shots, self.seed)?;
        warn_on_shot_mismatch(observed, self.config.shots);

        let divergence = self.divergence(observed, &reference)?;
        let bootstrap = self.bootstrap(oracle, &prepared, &reference)?;
        let threshold = percentile(&bootstrap, 100.0 * (1.0 - self.config.overkill_bound))?;
        let detected = divergence > threshold;

        debug!(
            divergence,
            threshold,
            detected,
            test_escape_bound = self.config.test_escape_bound,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "divergence test completed"
        );
        Ok(DivergenceReport {
            divergence,
            threshold,
            bootstrap,
            detected,
        })
    }

    /// Run [`evaluate`](Self::evaluate) and return only the verdict.
    pub fn detect<O: Oracle + ?Sized>(
        &self,
        oracle: &O,
        fault: Option<&dyn FaultModel>,
        circuit: &Circuit,
        observed: &OutcomeDistribution,
    ) -> FaultResult<bool> {
        Ok(self.evaluate(oracle, fault, circuit, observed)?.detected)
    }

    /// `D(p ‖ q)` after normalizing both and flooring outcomes missing from
    /// either side.
    pub fn divergence(
        &self,
        p: &OutcomeDistribution,
        q: &OutcomeDistribution,
    ) -> FaultResult<f64> {
        let keys = aligned_keys(p, q);
        let floor = self.config.probability_floor;
        let p = aligned_vector(&p.probabilities()?, &keys, floor);
        let q = aligned_vector(&q.probabilities()?, &keys, floor);
        kl_divergence(&p, &q)
    }

    fn bootstrap<O: Oracle + ?Sized>(
        &self,
        oracle: &O,
        prepared: &Circuit,
        reference: &OutcomeDistribution,
    ) -> FaultResult<Vec<f64>> {
        let resample = |i: usize| -> FaultResult<f64> {
            let seed = self.seed.map(|s| stream_seed(s, i as u64));
            let sample = oracle.execute(prepared, self.config.shots, seed)?;
            self.divergence(&sample, reference)
        };

        let n = self.config.bootstrap_samples;
        if self.config.parallel {
            (0..n).into_par_iter().map(resample).collect()
        } else {
            (0..n).map(resample).collect()
        }
    }
}

/// Divergence detection with explicit parameters.
///
/// Unseeded and parallel: every run draws fresh entropy.
#[allow(clippy::too_many_arguments)]
#[instrument(skip(oracle, fault, circuit, observed))]
pub fn detect_by_divergence<O: Oracle + ?Sized>(
    oracle: &O,
    fault: &dyn FaultModel,
    circuit: &Circuit,
    observed: &OutcomeDistribution,
    test_escape_bound: f64,
    overkill_bound: f64,
    shots: u32,
    bootstrap_samples: usize,
) -> FaultResult<bool> {
    let detector = DivergenceDetector::new(DivergenceConfig {
        test_escape_bound,
        overkill_bound,
        shots,
        bootstrap_samples,
        ..DivergenceConfig::default()
    });
    detector.detect(oracle, Some(fault), circuit, observed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FaultError;
    use qfault_hal::{HalError, HalResult};

    struct FixedOracle(OutcomeDistribution);

    impl Oracle for FixedOracle {
        fn name(&self) -> &str {
            "fixed"
        }
        fn max_qubits(&self) -> usize {
            8
        }
        fn execute(
            &self,
            _circuit: &Circuit,
            _shots: u32,
            _seed: Option<u64>,
        ) -> HalResult<OutcomeDistribution> {
            Ok(self.0.clone())
        }
    }

    struct BrokenOracle;

    impl Oracle for BrokenOracle {
        fn name(&self) -> &str {
            "broken"
        }
        fn max_qubits(&self) -> usize {
            8
        }
        fn execute(
            &self,
            _circuit: &Circuit,
            _shots: u32,
            _seed: Option<u64>,
        ) -> HalResult<OutcomeDistribution> {
            Err(HalError::Backend("offline".into()))
        }
    }

    fn config(bootstrap_samples: usize) -> DivergenceConfig {
        DivergenceConfig {
            shots: 1000,
            bootstrap_samples,
            ..DivergenceConfig::default()
        }
    }

    #[test]
    fn test_identical_distributions_have_zero_divergence() {
        let dist = OutcomeDistribution::from_counts([("0", 1000)]);
        let det = DivergenceDetector::new(config(10));
        assert_eq!(det.divergence(&dist, &dist).unwrap(), 0.0);
    }

    #[test]
    fn test_missing_outcome_is_floored() {
        let p = OutcomeDistribution::from_counts([("0", 500), ("1", 500)]);
        let q = OutcomeDistribution::from_counts([("0", 1000)]);
        let d = DivergenceDetector::new(config(10)).divergence(&p, &q).unwrap();
        assert!(d.is_finite());
        assert!(d > 5.0);
    }

    #[test]
    fn test_deterministic_oracle_gives_zero_threshold() {
        let dist = OutcomeDistribution::from_counts([("0", 1000)]);
        let oracle = FixedOracle(dist.clone());
        let circuit = Circuit::bell().unwrap();

        let report = DivergenceDetector::new(config(5))
            .evaluate(&oracle, None, &circuit, &dist)
            .unwrap();
        assert_eq!(report.bootstrap, vec![0.0; 5]);
        assert_eq!(report.threshold, 0.0);
        assert!(!report.detected);

        let flipped = OutcomeDistribution::from_counts([("1", 1000)]);
        let report = DivergenceDetector::new(config(5))
            .evaluate(&oracle, None, &circuit, &flipped)
            .unwrap();
        assert!(report.detected);
    }

    #[test]
    fn test_zero_bootstrap_samples_rejected() {
        let dist = OutcomeDistribution::from_counts([("0", 1000)]);
        let result = DivergenceDetector::new(config(0)).evaluate(
            &FixedOracle(dist.clone()),
            None,
            &Circuit::bell().unwrap(),
            &dist,
        );
        assert!(matches!(result, Err(FaultError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_unnormalizable_observation_is_invalid_configuration() {
        let oracle = FixedOracle(OutcomeDistribution::from_counts([("0", 1000)]));
        let circuit = Circuit::bell().unwrap();
        let det = DivergenceDetector::new(config(3));

        let empty = OutcomeDistribution::new();
        let result = det.evaluate(&oracle, None, &circuit, &empty);
        assert!(matches!(result, Err(FaultError::InvalidConfiguration(_))));

        let mut negative = OutcomeDistribution::new();
        negative.insert("0", -5.0);
        let result = det.evaluate(&oracle, None, &circuit, &negative);
        assert!(matches!(result, Err(FaultError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_oracle_failure_propagates() {
        let dist = OutcomeDistribution::from_counts([("0", 1000)]);
        let result = DivergenceDetector::new(config(3)).evaluate(
            &BrokenOracle,
            None,
            &Circuit::bell().unwrap(),
            &dist,
        );
        assert!(matches!(
            result,
            Err(FaultError::Simulation(HalError::Backend(_)))
        ));
    }
}
