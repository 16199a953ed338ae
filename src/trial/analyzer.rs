//! Cross-trial analysis over persisted trial records
//!
//! Records are immutable once written, so any number of analyzers may read
//! the same directory concurrently. With the `rayon` feature the records of
//! one analysis are loaded in parallel.

use std::ops::RangeInclusive;

#[cfg(feature = "rayon")]
use rayon::prelude::*;
use tracing::debug;

use super::format::parse_record;
use super::{TrialLayout, TrialLedger, TrialRecord};
use crate::config::SamplingConfig;
use crate::{Error, Result};

/// First trial of the standard comparison sweep
pub const DEFAULT_FIRST_TRIAL: u32 = 1;
/// Last trial of the standard comparison sweep
pub const DEFAULT_LAST_TRIAL: u32 = 27;
/// Row whose runtime is compared across trials (the 11th evaluation)
pub const DEFAULT_TARGET_INDEX: usize = 10;

/// Convergence series of one trial.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialSeries {
    /// Trial number
    pub trial: u32,
    /// Sampling configuration of the trial
    pub sampling: SamplingConfig,
    /// Fidelity per recorded iteration
    pub fidelity: Vec<f64>,
    /// Relative error per recorded iteration
    pub relative_error: Vec<f64>,
    /// Runtime per recorded iteration
    pub runtime: Vec<f64>,
}

impl TrialSeries {
    fn from_record(record: &TrialRecord) -> Self {
        Self {
            trial: record.trial_id(),
            sampling: *record.sampling(),
            fidelity: record.fidelities(),
            relative_error: record.relative_errors(),
            runtime: record.runtimes(),
        }
    }

    /// Plot title describing the sampling configuration
    #[must_use]
    pub fn title(&self) -> String {
        format!(
            "Samples = {} & Burn In = {} & Steps = {}",
            self.sampling.num_samples, self.sampling.burn_in, self.sampling.steps
        )
    }

    /// 1-based evaluation numbers for the x axis
    #[must_use]
    pub fn epochs(&self) -> Vec<usize> {
        (1..=self.fidelity.len()).collect()
    }
}

/// Result of comparing a range of trials.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialComparison {
    /// Row index the runtimes were taken at
    pub target_index: usize,
    /// `(trial, runtime at target_index)` in trial order
    pub runtime_at_target: Vec<(u32, f64)>,
    /// Full convergence series per trial, in trial order
    pub series: Vec<TrialSeries>,
}

impl TrialComparison {
    /// Hand every computed series to `sink`.
    ///
    /// # Errors
    ///
    /// Propagates the first sink error.
    pub fn render<P: PlotSink + ?Sized>(&self, sink: &mut P) -> Result<()> {
        sink.runtime_comparison(self.target_index, &self.runtime_at_target)?;
        for series in &self.series {
            sink.convergence(series)?;
        }
        Ok(())
    }
}

/// Rendering backend for analysis output.
///
/// Receives fully computed series; drawing and file output are up to the
/// implementation.
pub trait PlotSink {
    /// Runtime at `target_index` for each trial.
    ///
    /// # Errors
    ///
    /// Implementations report rendering failures.
    fn runtime_comparison(&mut self, target_index: usize, points: &[(u32, f64)]) -> Result<()>;

    /// Fidelity and relative error convergence of one trial.
    ///
    /// # Errors
    ///
    /// Implementations report rendering failures.
    fn convergence(&mut self, series: &TrialSeries) -> Result<()>;
}

/// Loads trial records of one system size and compares them.
#[derive(Debug, Clone)]
pub struct TrialAnalyzer {
    layout: TrialLayout,
}

impl TrialAnalyzer {
    /// Analyzer reading records under `layout`
    #[must_use]
    pub const fn new(layout: TrialLayout) -> Self {
        Self { layout }
    }

    /// Directory layout records are read from
    #[must_use]
    pub const fn layout(&self) -> &TrialLayout {
        &self.layout
    }

    /// Load and parse the record of `trial`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the record is missing and
    /// `Error::MalformedRecord` if it does not parse or its row count
    /// disagrees with the ledger.
    pub fn load(&self, trial: u32) -> Result<TrialRecord> {
        let ledger = TrialLedger::load(&self.layout.ledger_path())?;
        self.load_checked(trial, ledger.as_ref())
    }

    fn load_checked(&self, trial: u32, ledger: Option<&TrialLedger>) -> Result<TrialRecord> {
        let path = self.layout.record_path(trial);
        let text = std::fs::read_to_string(&path)?;
        let record = parse_record(trial, &text)?;

        if let Some(entry) = ledger.and_then(|l| l.get(trial)) {
            if entry.rows != record.len() {
                return Err(Error::malformed(
                    0,
                    format!(
                        "trial {trial} has {} rows, ledger recorded {}",
                        record.len(),
                        entry.rows
                    ),
                ));
            }
        }
        debug!(trial, rows = record.len(), "trial record loaded");
        Ok(record)
    }

    /// Load every trial in `trials`, in trial order.
    ///
    /// # Errors
    ///
    /// Fails on the first record that cannot be loaded.
    pub fn load_all(&self, trials: RangeInclusive<u32>) -> Result<Vec<TrialRecord>> {
        let ledger = TrialLedger::load(&self.layout.ledger_path())?;
        let ledger = ledger.as_ref();

        #[cfg(feature = "rayon")]
        let records = trials
            .into_par_iter()
            .map(|trial| self.load_checked(trial, ledger))
            .collect();
        #[cfg(not(feature = "rayon"))]
        let records = trials
            .map(|trial| self.load_checked(trial, ledger))
            .collect();

        records
    }

    /// Compare `trials` at row `target_index`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` for an empty range,
    /// `Error::TruncatedTrial` if any record has at most `target_index` rows,
    /// and any load error.
    pub fn analyze(&self, trials: RangeInclusive<u32>, target_index: usize) -> Result<TrialComparison> {
        if trials.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "empty trial range {}..={}",
                trials.start(),
                trials.end()
            )));
        }

        let records = self.load_all(trials)?;
        let required = target_index + 1;

        let mut runtime_at_target = Vec::with_capacity(records.len());
        let mut series = Vec::with_capacity(records.len());
        for record in &records {
            let row = record.rows().get(target_index).ok_or(Error::TruncatedTrial {
                trial: record.trial_id(),
                rows: record.len(),
                required,
            })?;
            runtime_at_target.push((record.trial_id(), row.runtime));
            series.push(TrialSeries::from_record(record));
        }

        Ok(TrialComparison {
            target_index,
            runtime_at_target,
            series,
        })
    }
}
