//! Repeated-trial detection campaigns.
//!
//! A campaign samples an observed distribution `trials` times and counts how
//! often a detector fires. Run without a fault it estimates the overkill
//! rate; run with a fault, `1 - rate` estimates the test-escape rate.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use qfault_hal::{Oracle, OutcomeDistribution};
use qfault_ir::Circuit;

use crate::chi_square::ChiSquareDetector;
use crate::divergence::DivergenceDetector;
use crate::error::{FaultError, FaultResult};
use crate::fault::FaultModel;
use crate::injector::FaultInjector;
use crate::stats::stream_seed;

/// A detector that turns an observed distribution into a verdict.
pub trait Detector: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Whether `observed` indicates a fault in `circuit`.
    fn detect(
        &self,
        oracle: &dyn Oracle,
        fault: Option<&dyn FaultModel>,
        circuit: &Circuit,
        observed: &OutcomeDistribution,
    ) -> FaultResult<bool>;
}

impl Detector for ChiSquareDetector {
    fn name(&self) -> &str {
        "chi-square"
    }

    fn detect(
        &self,
        oracle: &dyn Oracle,
        fault: Option<&dyn FaultModel>,
        circuit: &Circuit,
        observed: &OutcomeDistribution,
    ) -> FaultResult<bool> {
        ChiSquareDetector::detect(self, oracle, fault, circuit, observed)
    }
}

impl Detector for DivergenceDetector {
    fn name(&self) -> &str {
        "kl-divergence"
    }

    fn detect(
        &self,
        oracle: &dyn Oracle,
        fault: Option<&dyn FaultModel>,
        circuit: &Circuit,
        observed: &OutcomeDistribution,
    ) -> FaultResult<bool> {
        DivergenceDetector::detect(self, oracle, fault, circuit, observed)
    }
}

/// Empirical detection rate over repeated trials.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CampaignReport {
    pub trials: usize,
    pub detections: usize,
    /// `detections / trials`.
    pub rate: f64,
}

/// Settings for a detection-rate campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionCampaign {
    /// Number of observed distributions to sample.
    pub trials: usize,
    /// Shots per observed distribution.
    pub shots: u32,
    /// Observed trial `i` uses [`stream_seed`]`(seed, i)`.
    pub seed: Option<u64>,
}

impl DetectionCampaign {
    pub fn new(trials: usize, shots: u32) -> Self {
        Self {
            trials,
            shots,
            seed: None,
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sample `trials` observations of `circuit` (with `fault` injected when
    /// given) and count how many `detector` flags.
    #[instrument(skip_all, fields(
        detector = detector.name(),
        circuit = circuit.name(),
        trials = self.trials,
        faulty = fault.is_some(),
    ))]
    pub fn detection_rate(
        &self,
        oracle: &dyn Oracle,
        detector: &dyn Detector,
        circuit: &Circuit,
        fault: Option<&dyn FaultModel>,
    ) -> FaultResult<CampaignReport> {
        if self.trials == 0 {
            return Err(FaultError::InvalidConfiguration(
                "campaign needs at least one trial".into(),
            ));
        }

        let mut detections = 0;
        for trial in 0..self.trials {
            let seed = self.seed.map(|s| stream_seed(s, trial as u64));
            let observed = FaultInjector::simulate(oracle, circuit, fault, self.shots, seed)?;
            if detector.detect(oracle, fault, circuit, &observed)? {
                detections += 1;
            }
        }

        let report = CampaignReport {
            trials: self.trials,
            detections,
            rate: detections as f64 / self.trials as f64,
        };
        info!(
            detections = report.detections,
            rate = report.rate,
            "campaign finished"
        );
        Ok(report)
    }
}
