//! Trial records: persistence and cross-trial analysis
//!
//! ## Record Overview
//!
//! ```text
//! TrialRecord (one per training run)
//!   ├── trial_id
//!   ├── SamplingConfig      [header: samples / burn_in / steps]
//!   └──< TrialRow (N)       [one per evaluated iteration, in order]
//!          fidelity, relative_error, runtime, mean, variance, std_error
//! ```
//!
//! Records live under `Data/Energy/Q<N>/Trial<T>.txt` next to a
//! `trials.json` ledger that assigns trial numbers and pins row counts.
//!
//! ## Usage
//!
//! ```rust
//! use qtrial::config::SamplingConfig;
//! use qtrial::monitor::StatSummary;
//! use qtrial::trial::{format, TrialRecord};
//!
//! let means = [StatSummary::new(-3.5, 0.2, 0.01), StatSummary::new(-3.9, 0.1, 0.01)];
//! let record = TrialRecord::from_series(
//!     1,
//!     SamplingConfig::default(),
//!     -4.0,
//!     &[0.91, 0.95],
//!     &means,
//!     &[1.2, 2.4],
//! )?;
//!
//! let text = format::write_record(&record);
//! let parsed = format::parse_record(1, &text)?;
//! assert_eq!(parsed.len(), 2);
//! assert!((parsed.relative_errors()[0] - 0.125).abs() < 1e-9);
//! # Ok::<(), qtrial::Error>(())
//! ```

pub mod analyzer;
pub mod format;
mod layout;
mod ledger;
pub mod recorder;
pub mod reference;

pub use analyzer::{PlotSink, TrialAnalyzer, TrialComparison, TrialSeries};
pub use layout::{parse_trial_number, TrialLayout};
pub use ledger::{LedgerEntry, TrialLedger};
pub use recorder::TrialRecorder;
pub use reference::load_reference_value;

use serde::{Deserialize, Serialize};

use crate::config::SamplingConfig;
use crate::monitor::StatSummary;
use crate::{Error, Result};

/// Decimal places kept for fidelity
pub const FIDELITY_PRECISION: i32 = 3;
/// Decimal places kept for relative error
pub const RELATIVE_ERROR_PRECISION: i32 = 6;
/// Decimal places kept for runtime (seconds)
pub const RUNTIME_PRECISION: i32 = 3;
/// Decimal places kept for mean, variance and standard error
pub const STATISTIC_PRECISION: i32 = 5;

/// Round `value` to `places` decimal places.
#[must_use]
pub fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// `|mean - reference| / |reference|`.
///
/// # Errors
///
/// Returns `Error::ZeroReference` when `reference` is zero.
pub fn relative_error(mean: f64, reference: f64) -> Result<f64> {
    if reference == 0.0 {
        return Err(Error::ZeroReference);
    }
    Ok((mean - reference).abs() / reference.abs())
}

/// One recorded iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialRow {
    /// Exact overlap with the reference state
    pub fidelity: f64,
    /// Relative error of the observable mean against the reference value
    pub relative_error: f64,
    /// Wall-clock seconds since training began
    pub runtime: f64,
    /// Observable sample mean
    pub mean: f64,
    /// Observable sample variance
    pub variance: f64,
    /// Standard error of the mean
    pub std_error: f64,
}

impl TrialRow {
    /// Copy of the row rounded to the record's column precisions.
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self {
            fidelity: round_to(self.fidelity, FIDELITY_PRECISION),
            relative_error: round_to(self.relative_error, RELATIVE_ERROR_PRECISION),
            runtime: round_to(self.runtime, RUNTIME_PRECISION),
            mean: round_to(self.mean, STATISTIC_PRECISION),
            variance: round_to(self.variance, STATISTIC_PRECISION),
            std_error: round_to(self.std_error, STATISTIC_PRECISION),
        }
    }

    /// First non-finite column as `(name, value)`, if any.
    #[must_use]
    pub fn non_finite(&self) -> Option<(&'static str, f64)> {
        [
            ("fidelity", self.fidelity),
            ("relative_error", self.relative_error),
            ("runtime", self.runtime),
            ("mean", self.mean),
            ("variance", self.variance),
            ("std_error", self.std_error),
        ]
        .into_iter()
        .find(|(_, v)| !v.is_finite())
    }
}

/// Configuration and per-iteration metrics of one trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    trial_id: u32,
    sampling: SamplingConfig,
    rows: Vec<TrialRow>,
}

impl TrialRecord {
    /// Create a record from already-computed rows.
    #[must_use]
    pub fn new(trial_id: u32, sampling: SamplingConfig, rows: Vec<TrialRow>) -> Self {
        Self {
            trial_id,
            sampling,
            rows,
        }
    }

    /// Build a record from aligned per-iteration series.
    ///
    /// # Errors
    ///
    /// Returns `Error::ZeroReference` for a zero reference,
    /// `Error::MisalignedHistories` if the series differ in length and
    /// `Error::NonFiniteValue` if any value is NaN or infinite.
    pub fn from_series(
        trial_id: u32,
        sampling: SamplingConfig,
        reference: f64,
        fidelities: &[f64],
        observable: &[StatSummary],
        runtimes: &[f64],
    ) -> Result<Self> {
        if reference == 0.0 {
            return Err(Error::ZeroReference);
        }
        if fidelities.len() != observable.len() || runtimes.len() != observable.len() {
            return Err(Error::MisalignedHistories {
                observable: observable.len(),
                metric: fidelities.len(),
                runtime: runtimes.len(),
            });
        }

        let rows = observable
            .iter()
            .zip(fidelities)
            .zip(runtimes)
            .enumerate()
            .map(|(i, ((stat, &fidelity), &runtime))| {
                let row = TrialRow {
                    fidelity,
                    relative_error: relative_error(stat.mean, reference)?,
                    runtime,
                    mean: stat.mean,
                    variance: stat.variance,
                    std_error: stat.std_error,
                };
                match row.non_finite() {
                    Some((column, value)) => Err(Error::NonFiniteValue {
                        what: format!("{column} in row {i}"),
                        value,
                    }),
                    None => Ok(row),
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(trial_id, sampling, rows))
    }

    /// Trial number
    #[must_use]
    pub const fn trial_id(&self) -> u32 {
        self.trial_id
    }

    /// Sampling configuration the trial ran with
    #[must_use]
    pub const fn sampling(&self) -> &SamplingConfig {
        &self.sampling
    }

    /// Rows in iteration order
    #[must_use]
    pub fn rows(&self) -> &[TrialRow] {
        &self.rows
    }

    /// Number of recorded iterations
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no iteration was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Fidelity column
    #[must_use]
    pub fn fidelities(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.fidelity).collect()
    }

    /// Relative error column
    #[must_use]
    pub fn relative_errors(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.relative_error).collect()
    }

    /// Runtime column
    #[must_use]
    pub fn runtimes(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.runtime).collect()
    }

    /// Mean column
    #[must_use]
    pub fn means(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.mean).collect()
    }

    /// `(mean - std_error, mean + std_error)` per row, for error-band plots
    #[must_use]
    pub fn error_band(&self) -> Vec<(f64, f64)> {
        self.rows
            .iter()
            .map(|r| (r.mean - r.std_error, r.mean + r.std_error))
            .collect()
    }
}
