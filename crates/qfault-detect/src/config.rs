//! Detector configuration.
//!
//! Supports loading configuration from:
//! 1. Configuration files (YAML)
//! 2. Environment variables (with `QFAULT_` prefix)
//!
//! Configuration precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file
//! 3. Default values
//!
//! ```yaml
//! seed: 7
//! chi_square:
//!   test_escape_bound: 0.05
//!   shots: 20000
//! divergence:
//!   bootstrap_samples: 200
//!   parallel: false
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::chi_square::ChiSquareDetector;
use crate::divergence::DivergenceDetector;
use crate::error::{FaultError, FaultResult};

/// Complete detection configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Chi-square detector settings
    #[serde(default)]
    pub chi_square: ChiSquareConfig,

    /// Divergence detector settings
    #[serde(default)]
    pub divergence: DivergenceConfig,

    /// Base seed for every simulation a detector runs. Unset draws fresh
    /// entropy on each call.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Goodness-of-fit detector settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChiSquareConfig {
    /// A fault is detected when the p-value falls below this bound
    #[serde(default = "default_chi_square_bound")]
    pub test_escape_bound: f64,

    /// Lower edge of the guard band reported for undetected runs
    #[serde(default = "default_chi_square_bound")]
    pub overkill_bound: f64,

    /// Shots for the reference run, and the total both vectors are rescaled to
    #[serde(default = "default_shots")]
    pub shots: u32,

    /// Added to every aligned frequency before rescaling
    #[serde(default = "default_smoothing")]
    pub smoothing: f64,
}

/// Divergence detector settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivergenceConfig {
    /// Recorded for parity with the chi-square detector; the verdict only
    /// depends on the bootstrap threshold
    #[serde(default = "default_divergence_bound")]
    pub test_escape_bound: f64,

    /// The threshold is the `1 - overkill_bound` quantile of the bootstrap
    #[serde(default = "default_divergence_bound")]
    pub overkill_bound: f64,

    /// Shots per reference and bootstrap run
    #[serde(default = "default_shots")]
    pub shots: u32,

    /// Number of fault-free resamples
    #[serde(default = "default_bootstrap_samples")]
    pub bootstrap_samples: usize,

    /// Probability given to an outcome missing from one side
    #[serde(default = "default_probability_floor")]
    pub probability_floor: f64,

    /// Run the bootstrap on the rayon thread pool
    #[serde(default = "default_true")]
    pub parallel: bool,
}

// Default value functions
fn default_chi_square_bound() -> f64 {
    0.05
}

fn default_divergence_bound() -> f64 {
    0.01
}

fn default_shots() -> u32 {
    100_000
}

fn default_smoothing() -> f64 {
    1e-6
}

fn default_bootstrap_samples() -> usize {
    100
}

fn default_probability_floor() -> f64 {
    1e-9
}

fn default_true() -> bool {
    true
}

impl Default for ChiSquareConfig {
    fn default() -> Self {
        ChiSquareConfig {
            test_escape_bound: default_chi_square_bound(),
            overkill_bound: default_chi_square_bound(),
            shots: default_shots(),
            smoothing: default_smoothing(),
        }
    }
}

impl Default for DivergenceConfig {
    fn default() -> Self {
        DivergenceConfig {
            test_escape_bound: default_divergence_bound(),
            overkill_bound: default_divergence_bound(),
            shots: default_shots(),
            bootstrap_samples: default_bootstrap_samples(),
            probability_floor: default_probability_floor(),
            parallel: true,
        }
    }
}

fn check_bound(name: &str, value: f64) -> FaultResult<()> {
    if !(value > 0.0 && value < 1.0) {
        return Err(FaultError::InvalidConfiguration(format!(
            "{name} must lie in (0, 1), got {value}"
        )));
    }
    Ok(())
}

fn check_shots(shots: u32) -> FaultResult<()> {
    if shots == 0 {
        return Err(FaultError::InvalidConfiguration(
            "shots must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

impl ChiSquareConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> FaultResult<()> {
        check_bound("chi_square.test_escape_bound", self.test_escape_bound)?;
        check_bound("chi_square.overkill_bound", self.overkill_bound)?;
        check_shots(self.shots)?;
        if !(self.smoothing > 0.0 && self.smoothing.is_finite()) {
            return Err(FaultError::InvalidConfiguration(format!(
                "chi_square.smoothing must be positive, got {}",
                self.smoothing
            )));
        }
        Ok(())
    }
}

impl DivergenceConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> FaultResult<()> {
        check_bound("divergence.test_escape_bound", self.test_escape_bound)?;
        check_bound("divergence.overkill_bound", self.overkill_bound)?;
        check_shots(self.shots)?;
        if self.bootstrap_samples == 0 {
            return Err(FaultError::InvalidConfiguration(
                "divergence.bootstrap_samples must be at least 1".to_string(),
            ));
        }
        if !(self.probability_floor > 0.0 && self.probability_floor < 1.0) {
            return Err(FaultError::InvalidConfiguration(format!(
                "divergence.probability_floor must lie in (0, 1), got {}",
                self.probability_floor
            )));
        }
        Ok(())
    }
}

impl DetectionConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> FaultResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let config = Self::from_yaml(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string without validating it.
    pub fn from_yaml(contents: &str) -> FaultResult<Self> {
        let config: DetectionConfig = serde_yaml_ng::from_str(contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        Ok(config)
    }

    /// Load configuration with the following precedence:
    /// 1. Load from file if provided
    /// 2. Apply environment variable overrides
    pub fn load(config_file: Option<&Path>) -> FaultResult<Self> {
        let config = if let Some(path) = config_file {
            Self::from_file(path)?
        } else {
            DetectionConfig::default()
        };

        let config = config.merge_env();
        config.validate()?;
        debug!(?config, "detection configuration loaded");
        Ok(config)
    }

    /// Merge `QFAULT_*` environment variables into this configuration.
    ///
    /// Only variables that are set and parse override the current values.
    /// `QFAULT_SHOTS`, `QFAULT_TEST_ESCAPE` and `QFAULT_OVERKILL` apply to
    /// both detectors.
    #[must_use]
    pub fn merge_env(self) -> Self {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    /// Merge overrides from an arbitrary variable source.
    #[must_use]
    pub fn merge_vars<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let parsed = |key: &str| lookup(key).map(|v| v.trim().to_string());

        if let Some(v) = parsed("QFAULT_SHOTS").and_then(|v| v.parse().ok()) {
            self.chi_square.shots = v;
            self.divergence.shots = v;
        }
        if let Some(v) = parsed("QFAULT_TEST_ESCAPE").and_then(|v| v.parse().ok()) {
            self.chi_square.test_escape_bound = v;
            self.divergence.test_escape_bound = v;
        }
        if let Some(v) = parsed("QFAULT_OVERKILL").and_then(|v| v.parse().ok()) {
            self.chi_square.overkill_bound = v;
            self.divergence.overkill_bound = v;
        }
        if let Some(v) = parsed("QFAULT_BOOTSTRAP_SAMPLES").and_then(|v| v.parse().ok()) {
            self.divergence.bootstrap_samples = v;
        }
        if let Some(v) = parsed("QFAULT_PARALLEL").and_then(|v| v.parse().ok()) {
            self.divergence.parallel = v;
        }
        if let Some(v) = parsed("QFAULT_SEED").and_then(|v| v.parse().ok()) {
            self.seed = Some(v);
        }
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> FaultResult<()> {
        self.chi_square.validate()?;
        self.divergence.validate()
    }

    /// A chi-square detector using these settings and seed.
    pub fn chi_square_detector(&self) -> ChiSquareDetector {
        ChiSquareDetector::new(self.chi_square.clone()).with_seed(self.seed)
    }

    /// A divergence detector using these settings and seed.
    pub fn divergence_detector(&self) -> DivergenceDetector {
        DivergenceDetector::new(self.divergence.clone()).with_seed(self.seed)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = DetectionConfig::default();
        assert_eq!(config.chi_square.test_escape_bound, 0.05);
        assert_eq!(config.chi_square.shots, 100_000);
        assert_eq!(config.divergence.overkill_bound, 0.01);
        assert_eq!(config.divergence.bootstrap_samples, 100);
        assert!(config.divergence.parallel);
        assert_eq!(config.seed, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = DetectionConfig::from_yaml(
            "seed: 7\nchi_square:\n  shots: 2000\ndivergence:\n  parallel: false\n",
        )
        .unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.chi_square.shots, 2000);
        assert_eq!(config.chi_square.smoothing, 1e-6);
        assert!(!config.divergence.parallel);
        assert_eq!(config.divergence.bootstrap_samples, 100);
    }

    #[test]
    fn test_invalid_yaml_is_parse_error() {
        let result = DetectionConfig::from_yaml("chi_square: [1, 2");
        assert!(matches!(
            result,
            Err(FaultError::Config(ConfigError::ParseError(_)))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = DetectionConfig::from_file("/nonexistent/qfault.yaml");
        assert!(matches!(
            result,
            Err(FaultError::Config(ConfigError::IoError(_)))
        ));
    }

    #[test]
    fn test_merge_vars_overrides() {
        let vars: HashMap<&str, &str> = [
            ("QFAULT_SHOTS", "5000"),
            ("QFAULT_SEED", "99"),
            ("QFAULT_BOOTSTRAP_SAMPLES", "20"),
            ("QFAULT_PARALLEL", "false"),
            ("QFAULT_OVERKILL", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let config = DetectionConfig::default()
            .merge_vars(|k| vars.get(k).map(|v| (*v).to_string()));
        assert_eq!(config.chi_square.shots, 5000);
        assert_eq!(config.divergence.shots, 5000);
        assert_eq!(config.seed, Some(99));
        assert_eq!(config.divergence.bootstrap_samples, 20);
        assert!(!config.divergence.parallel);
        assert_eq!(config.chi_square.overkill_bound, 0.05);
    }

    #[test]
    fn test_validate_rejects_nonsense() {
        let mut config = DetectionConfig::default();
        config.divergence.bootstrap_samples = 0;
        assert!(matches!(
            config.validate(),
            Err(FaultError::InvalidConfiguration(_))
        ));

        let mut config = DetectionConfig::default();
        config.chi_square.shots = 0;
        assert!(config.validate().is_err());

        let mut config = DetectionConfig::default();
        config.chi_square.test_escape_bound = 1.5;
        assert!(config.validate().is_err());

        let mut config = DetectionConfig::default();
        config.chi_square.smoothing = 0.0;
        assert!(config.validate().is_err());
    }
}
