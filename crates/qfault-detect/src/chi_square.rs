//! Chi-square goodness-of-fit detector.
//!
//! The observed counts are tested against a freshly simulated fault-free
//! reference. Both aligned vectors are smoothed and rescaled to the
//! configured shot count before the Pearson statistic is taken, so an
//! observed distribution sampled at a different size is compared as if it
//! had `shots` samples.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use qfault_hal::{Oracle, OutcomeDistribution, aligned_keys, aligned_vector};
use qfault_ir::Circuit;

use crate::config::ChiSquareConfig;
use crate::error::{FaultError, FaultResult};
use crate::fault::FaultModel;
use crate::injector::FaultInjector;
use crate::stats::chi_square_test;

/// Outcome of one chi-square detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChiSquareReport {
    /// Pearson statistic over the rescaled vectors.
    pub statistic: f64,
    /// Number of aligned outcomes minus one.
    pub degrees_of_freedom: usize,
    pub p_value: f64,
    /// `p_value < test_escape_bound`.
    pub detected: bool,
    /// Not detected, yet `p_value < overkill_bound`. Only reachable when the
    /// overkill bound is larger than the test-escape bound.
    pub in_guard_band: bool,
}

/// Detects faults with a Pearson chi-square test against a fault-free reference.
///
/// The reference is itself a finite sample, so on circuits with more than
/// one likely outcome the statistic is roughly twice as spread as the
/// textbook distribution. Fault-free observations are then flagged well
/// above `test_escape_bound` of the time (around 20% on a Bell pair at equal
/// shot counts). Use [`DivergenceDetector`](crate::DivergenceDetector) when
/// a calibrated overkill rate matters.
#[derive(Debug, Clone, Default)]
pub struct ChiSquareDetector {
    config: ChiSquareConfig,
    seed: Option<u64>,
}

impl ChiSquareDetector {
    pub fn new(config: ChiSquareConfig) -> Self {
        Self { config, seed: None }
    }

    /// Seed for the reference simulation. `None` draws fresh entropy.
    #[must_use]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn config(&self) -> &ChiSquareConfig {
        &self.config
    }

    /// Simulate the fault-free reference and test `observed` against it.
    ///
    /// `fault` names the hypothesis under test for logging; the reference
    /// always runs the unmodified circuit.
    #[instrument(skip_all, fields(circuit = circuit.name(), fault = fault.map(|f| f.description())))]
    pub fn evaluate<O: Oracle + ?Sized>(
        &self,
        oracle: &O,
        fault: Option<&dyn FaultModel>,
        circuit: &Circuit,
        observed: &OutcomeDistribution,
    ) -> FaultResult<ChiSquareReport> {
        self.config.validate()?;
        check_observed(observed)?;
        let reference =
            FaultInjector::simulate(oracle, circuit, None, self.config.shots, self.seed)?;
        warn_on_shot_mismatch(observed, self.config.shots);
        self.compare(observed, &reference)
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

    /// Test `observed` against an already simulated `reference`.
    pub fn compare(
        &self,
        observed: &OutcomeDistribution,
        reference: &OutcomeDistribution,
    ) -> FaultResult<ChiSquareReport> {
        let keys = aligned_keys(observed, reference);
        if keys.is_empty() {
            return Err(FaultError::StatisticalTest(
                "both distributions are empty".into(),
            ));
        }

        let shots = f64::from(self.config.shots);
        let observed = self.smoothed(aligned_vector(observed, &keys, 0.0), shots)?;
        let expected = self.smoothed(aligned_vector(reference, &keys, 0.0), shots)?;

        let outcome = chi_square_test(&observed, &expected)?;
        let detected = outcome.p_value < self.config.test_escape_bound;
        let in_guard_band = !detected && outcome.p_value < self.config.overkill_bound;
        if in_guard_band {
            debug!(
                p_value = outcome.p_value,
                overkill_bound = self.config.overkill_bound,
                "p-value inside the overkill guard band, reporting no detection"
            );
        }

        debug!(
            statistic = outcome.statistic,
            dof = outcome.degrees_of_freedom,
            p_value = outcome.p_value,
            detected,
            "chi-square test completed"
        );
        Ok(ChiSquareReport {
            statistic: outcome.statistic,
            degrees_of_freedom: outcome.degrees_of_freedom,
            p_value: outcome.p_value,
            detected,
            in_guard_band,
        })
    }

    fn smoothed(&self, mut frequencies: Vec<f64>, shots: f64) -> FaultResult<Vec<f64>> {
        for f in &mut frequencies {
            *f += self.config.smoothing;
        }
        let total: f64 = frequencies.iter().sum();
        if !(total > 0.0 && total.is_finite()) {
            return Err(FaultError::StatisticalTest(format!(
                "cannot rescale frequencies with total {total}"
            )));
        }
        for f in &mut frequencies {
            *f *= shots / total;
        }
        Ok(frequencies)
    }
}

/// An observed distribution that cannot be normalized is a caller error,
/// not an oracle failure.
pub(crate) fn check_observed(observed: &OutcomeDistribution) -> FaultResult<()> {
    observed.probabilities().map(|_| ()).map_err(|e| {
        FaultError::InvalidConfiguration(format!("observed distribution is unusable: {e}"))
    })
}

pub(crate) fn warn_on_shot_mismatch(observed: &OutcomeDistribution, shots: u32) {
    let total = observed.total();
    if (total - f64::from(shots)).abs() > 0.5 {
        warn!(
            observed_total = total,
            shots, "observed distribution was not sampled at the configured shot count"
        );
    }
}

/// Chi-square detection with explicit parameters.
///
/// Unseeded: the reference is drawn from fresh entropy on each call.
#[instrument(skip(oracle, fault, circuit, observed))]
pub fn detect_by_chi_square<O: Oracle + ?Sized>(
    oracle: &O,
    fault: &dyn FaultModel,
    circuit: &Circuit,
    observed: &OutcomeDistribution,
    test_escape_bound: f64,
    overkill_bound: f64,
    shots: u32,
) -> FaultResult<bool> {
    let detector = ChiSquareDetector::new(ChiSquareConfig {
        test_escape_bound,
        overkill_bound,
        shots,
        ..ChiSquareConfig::default()
    });
    detector.detect(oracle, Some(fault), circuit, observed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector(shots: u32) -> ChiSquareDetector {
        ChiSquareDetector::new(ChiSquareConfig {
            shots,
            ..ChiSquareConfig::default()
        })
    }

    #[test]
    fn test_identical_single_outcome() {
        let dist = OutcomeDistribution::from_counts([("0", 1000)]);
        let report = detector(1000).compare(&dist, &dist).unwrap();
        assert_eq!(report.degrees_of_freedom, 0);
        assert_eq!(report.p_value, 1.0);
        assert!(!report.detected);
    }

    #[test]
    fn test_flipped_distribution_detected() {
        let reference = OutcomeDistribution::from_counts([("0", 900), ("1", 100)]);
        let observed = OutcomeDistribution::from_counts([("0", 100), ("1", 900)]);
        let report = detector(1000).compare(&observed, &reference).unwrap();
        assert!(report.detected);
        assert!(report.statistic > 7000.0);
    }

    #[test]
    fn test_missing_keys_are_aligned() {
        let reference = OutcomeDistribution::from_counts([("00", 500), ("11", 500)]);
        let observed = OutcomeDistribution::from_counts([("00", 480), ("01", 40), ("11", 480)]);
        let report = detector(1000).compare(&observed, &reference).unwrap();
        assert_eq!(report.degrees_of_freedom, 2);
        assert!(report.detected);
    }

    #[test]
    fn test_rescaling_ignores_observed_size() {
        let reference = OutcomeDistribution::from_counts([("0", 600), ("1", 400)]);
        let observed = OutcomeDistribution::from_counts([("0", 60), ("1", 40)]);
        let report = detector(1000).compare(&observed, &reference).unwrap();
        assert!(report.statistic < 1e-9);
        assert!(!report.detected);
    }

    #[test]
    fn test_guard_band_never_flips_verdict() {
        let det = ChiSquareDetector::new(ChiSquareConfig {
            test_escape_bound: 0.01,
            overkill_bound: 0.2,
            shots: 1000,
            ..ChiSquareConfig::default()
        });
        // 530/470 against 500/500: statistic 3.6, p ≈ 0.058
        let reference = OutcomeDistribution::from_counts([("0", 500), ("1", 500)]);
        let observed = OutcomeDistribution::from_counts([("0", 530), ("1", 470)]);
        let report = det.compare(&observed, &reference).unwrap();
        assert!(!report.detected);
        assert!(report.in_guard_band);
    }

    #[test]
    fn test_empty_distributions_fail() {
        let empty = OutcomeDistribution::new();
        assert!(matches!(
            detector(1000).compare(&empty, &empty),
            Err(FaultError::StatisticalTest(_))
        ));
    }
}
