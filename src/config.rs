//! Monitoring configuration
//!
//! Sampling parameters are an explicit, typed structure. Unknown keys are
//! rejected on deserialization instead of being forwarded to the sampler.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default number of samples drawn per evaluation
pub const DEFAULT_NUM_SAMPLES: usize = 1000;
/// Default number of discarded initial sampler steps
pub const DEFAULT_BURN_IN: usize = 100;
/// Default sampler steps between retained samples
pub const DEFAULT_STEPS: usize = 100;
/// Default wall-clock training budget in seconds
pub const DEFAULT_MAX_TIME_SECS: f64 = 60.0;
/// Default enumeration limit for reference metrics (2^20 basis states)
pub const DEFAULT_MAX_ENUMERABLE_STATES: u64 = 1 << 20;

/// Parameters governing the external sampling procedure.
///
/// Immutable once handed to an evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SamplingConfig {
    /// Number of samples drawn per evaluation
    pub num_samples: usize,
    /// Sampler steps discarded before recording
    pub burn_in: usize,
    /// Sampler steps between retained samples
    pub steps: usize,
}

impl SamplingConfig {
    /// Create a sampling configuration.
    #[must_use]
    pub const fn new(num_samples: usize, burn_in: usize, steps: usize) -> Self {
        Self {
            num_samples,
            burn_in,
            steps,
        }
    }

    /// Parse a sampling configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` on malformed input or unknown keys.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Check that the sampler can produce at least one sample.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if `num_samples` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.num_samples == 0 {
            return Err(Error::InvalidConfig(
                "num_samples must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self::new(DEFAULT_NUM_SAMPLES, DEFAULT_BURN_IN, DEFAULT_STEPS)
    }
}

/// How the trial number of a new record is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialSelection {
    /// One past the highest trial already recorded
    #[default]
    Next,
    /// Caller-supplied trial number
    Explicit(u32),
}

/// Configuration of one monitored training trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct MonitorConfig {
    /// Number of qubits (visible units) of the system
    pub qubits: usize,
    /// Sampling parameters for observable evaluation
    pub sampling: SamplingConfig,
    /// Evaluation period in iterations
    pub period: u64,
    /// Wall-clock training budget in seconds
    pub max_time_secs: f64,
    /// Trial numbering policy
    pub trial: TrialSelection,
    /// Log one progress line per evaluation
    pub verbose: bool,
    /// Largest state space the reference metric may enumerate
    pub max_enumerable_states: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            qubits: 2,
            sampling: SamplingConfig::default(),
            period: 1,
            max_time_secs: DEFAULT_MAX_TIME_SECS,
            trial: TrialSelection::Next,
            verbose: true,
            max_enumerable_states: DEFAULT_MAX_ENUMERABLE_STATES,
        }
    }
}

impl MonitorConfig {
    /// Create a configuration for a system of `qubits` qubits with defaults.
    #[must_use]
    pub fn new(qubits: usize) -> Self {
        Self {
            qubits,
            ..Self::default()
        }
    }

    /// Set sampling parameters
    #[must_use]
    pub const fn sampling(mut self, sampling: SamplingConfig) -> Self {
        self.sampling = sampling;
        self
    }

    /// Set the evaluation period
    #[must_use]
    pub const fn period(mut self, period: u64) -> Self {
        self.period = period;
        self
    }

    /// Set the wall-clock budget in seconds
    #[must_use]
    pub const fn max_time_secs(mut self, secs: f64) -> Self {
        self.max_time_secs = secs;
        self
    }

    /// Set the trial numbering policy
    #[must_use]
    pub const fn trial(mut self, trial: TrialSelection) -> Self {
        self.trial = trial;
        self
    }

    /// Enable or disable progress lines
    #[must_use]
    pub const fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set the reference metric enumeration limit
    #[must_use]
    pub const fn max_enumerable_states(mut self, limit: u64) -> Self {
        self.max_enumerable_states = limit;
        self
    }

    /// Load and validate a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, contains unknown keys,
    /// or fails validation.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` for a zero period, zero qubits, a
    /// non-finite or non-positive time budget, or an empty sample count.
    pub fn validate(&self) -> Result<()> {
        if self.qubits == 0 {
            return Err(Error::InvalidConfig("qubits must be at least 1".to_string()));
        }
        if self.period == 0 {
            return Err(Error::InvalidConfig("period must be at least 1".to_string()));
        }
        if !self.max_time_secs.is_finite() || self.max_time_secs <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "max_time_secs must be a positive number, got {}",
                self.max_time_secs
            )));
        }
        self.sampling.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampling_defaults_match_energy_script() {
        let config = SamplingConfig::default();
        assert_eq!(config, SamplingConfig::new(1000, 100, 100));
    }

    #[test]
    fn test_sampling_rejects_unknown_keys() {
        let json = r#"{"num_samples": 10, "burn_in": 1, "steps": 1, "num_chains": 4}"#;
        let err = SamplingConfig::from_json(json).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
        assert!(err.to_string().contains("num_chains"));
    }

    #[test]
    fn test_sampling_from_json() {
        let json = r#"{"num_samples": 500, "burn_in": 10, "steps": 5}"#;
        let config = SamplingConfig::from_json(json).unwrap();
        assert_eq!(config, SamplingConfig::new(500, 10, 5));
    }

    #[test]
    fn test_monitor_config_partial_json_uses_defaults() {
        let config: MonitorConfig =
            serde_json::from_str(r#"{"qubits": 4, "trial": {"explicit": 7}}"#).unwrap();
        assert_eq!(config.qubits, 4);
        assert_eq!(config.trial, TrialSelection::Explicit(7));
        assert_eq!(config.period, 1);
        assert_eq!(config.sampling, SamplingConfig::default());
    }

    #[test]
    fn test_monitor_config_rejects_unknown_keys() {
        let err = serde_json::from_str::<MonitorConfig>(r#"{"qubits": 4, "learning_rate": 0.1}"#)
            .unwrap_err();
        assert!(err.to_string().contains("learning_rate"));

        let nested = r#"{"qubits": 4, "sampling": {"num_samples": 10, "burn_in": 1, "steps": 1, "num_chains": 2}}"#;
        let err = serde_json::from_str::<MonitorConfig>(nested).unwrap_err();
        assert!(err.to_string().contains("num_chains"));
    }

    #[test]
    fn test_monitor_config_rejects_zero_period() {
        let err = MonitorConfig::new(2).period(0).validate().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_monitor_config_rejects_bad_budget() {
        assert!(MonitorConfig::new(2).max_time_secs(0.0).validate().is_err());
        assert!(MonitorConfig::new(2).max_time_secs(f64::NAN).validate().is_err());
        assert!(MonitorConfig::new(2).max_time_secs(5.0).validate().is_ok());
    }

    #[test]
    fn test_monitor_config_rejects_empty_sampling() {
        let config = MonitorConfig::new(2).sampling(SamplingConfig::new(0, 0, 0));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_monitor_config_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitor.json");
        std::fs::write(&path, r#"{"qubits": 3, "max_time_secs": 30.0, "verbose": false}"#)
            .unwrap();

        let config = MonitorConfig::from_json_file(&path).unwrap();
        assert_eq!(config.qubits, 3);
        assert!(!config.verbose);
        assert!((config.max_time_secs - 30.0).abs() < f64::EPSILON);
    }
}
