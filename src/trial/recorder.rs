//! Trial recorder - turns evaluator histories into a persisted record

use std::path::PathBuf;

use tracing::{info, warn};

use super::format::write_record;
use super::layout::parse_trial_number;
use super::{TrialLayout, TrialLedger, TrialRecord};
use crate::config::TrialSelection;
use crate::monitor::{Clock, PeriodicEvaluator, ReferenceMetric, ReferenceMetricEvaluator, TimeBudgetGuard};
use crate::{Error, Result};

/// Writes trial records and keeps the trial ledger up to date.
///
/// Reads the final histories from named evaluator handles, so nothing
/// depends on the order the callbacks were registered in.
#[derive(Debug, Clone)]
pub struct TrialRecorder {
    layout: TrialLayout,
    reference: f64,
}

impl TrialRecorder {
    /// Recorder writing under `layout`, computing relative errors against `reference`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ZeroReference` for a zero reference and
    /// `Error::InvalidConfig` for a non-finite one.
    pub fn new(layout: TrialLayout, reference: f64) -> Result<Self> {
        if reference == 0.0 {
            return Err(Error::ZeroReference);
        }
        if !reference.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "reference value must be finite, got {reference}"
            )));
        }
        Ok(Self { layout, reference })
    }

    /// Directory layout records are written to
    #[must_use]
    pub const fn layout(&self) -> &TrialLayout {
        &self.layout
    }

    /// Reference value relative errors are computed against
    #[must_use]
    pub const fn reference(&self) -> f64 {
        self.reference
    }

    /// Trial number for `selection`.
    ///
    /// `Next` is one past the highest trial in either the ledger or the
    /// `Trial<digits>.txt` files of the record directory, so records
    /// written before the ledger existed are never overwritten.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoPriorTrial` if `Next` finds no earlier trial and
    /// `Error::InvalidConfig` if the highest trial is `u32::MAX`.
    pub fn resolve_trial(&self, selection: TrialSelection) -> Result<u32> {
        match selection {
            TrialSelection::Explicit(trial) => Ok(trial),
            TrialSelection::Next => {
                let from_ledger = TrialLedger::load(&self.layout.ledger_path())?
                    .and_then(|l| l.highest_trial());
                let highest = from_ledger
                    .max(self.scan_highest_trial()?)
                    .ok_or_else(|| Error::NoPriorTrial {
                        dir: self.layout.record_dir(),
                    })?;
                highest.checked_add(1).ok_or_else(|| {
                    Error::InvalidConfig(format!(
                        "trial {highest} is the last representable trial number"
                    ))
                })
            }
        }
    }

    fn scan_highest_trial(&self) -> Result<Option<u32>> {
        let dir = self.layout.record_dir();
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut highest = None;
        for entry in entries {
            let name = entry?.file_name();
            if let Some(trial) = name.to_str().and_then(parse_trial_number) {
                highest = highest.max(Some(trial));
            }
        }
        Ok(highest)
    }

    /// Assemble the record of trial `trial_id` from the final histories.
    ///
    /// Row `i` combines the `i`-th evaluation of each callback; all three
    /// must have evaluated the same iterations.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownObservable` if `observable` is not tracked and
    /// `Error::MisalignedHistories` if the histories disagree.
    pub fn build_record<S, R, C>(
        &self,
        trial_id: u32,
        evaluator: &PeriodicEvaluator<S>,
        observable: &str,
        metric: &ReferenceMetricEvaluator<R>,
        guard: &TimeBudgetGuard<C>,
    ) -> Result<TrialRecord>
    where
        R: ReferenceMetric,
        C: Clock,
    {
        let observable_iterations = evaluator.history().iterations();
        if observable_iterations != metric.history().iterations()
            || observable_iterations != guard.history().iterations()
        {
            return Err(Error::MisalignedHistories {
                observable: evaluator.len(),
                metric: metric.history().len(),
                runtime: guard.history().len(),
            });
        }

        TrialRecord::from_series(
            trial_id,
            *evaluator.sampling(),
            self.reference,
            &metric.values(),
            &evaluator.series(observable)?,
            &guard.runtimes_secs(),
        )
    }

    /// Write `record` to its record file and enter it in the ledger.
    ///
    /// The file is written whole to a temporary path and renamed into place.
    ///
    /// # Errors
    ///
    /// Returns error if any filesystem step fails.
    pub fn persist(&self, record: &TrialRecord) -> Result<PathBuf> {
        let dir = self.layout.record_dir();
        std::fs::create_dir_all(&dir)?;

        let path = self.layout.record_path(record.trial_id());
        if path.exists() {
            warn!(path = %path.display(), "overwriting existing trial record");
        }
        let tmp = path.with_extension("txt.tmp");
        std::fs::write(&tmp, write_record(record))?;
        std::fs::rename(&tmp, &path)?;

        let ledger_path = self.layout.ledger_path();
        let mut ledger = TrialLedger::load(&ledger_path)?.unwrap_or_default();
        ledger.record(record.trial_id(), record.len());
        ledger.save(&ledger_path)?;

        info!(
            trial = record.trial_id(),
            rows = record.len(),
            path = %path.display(),
            "trial record persisted"
        );
        Ok(path)
    }

    /// Resolve the trial number, build the record and persist it.
    ///
    /// # Errors
    ///
    /// Propagates errors from `resolve_trial`, `build_record` and `persist`.
    pub fn record<S, R, C>(
        &self,
        selection: TrialSelection,
        evaluator: &PeriodicEvaluator<S>,
        observable: &str,
        metric: &ReferenceMetricEvaluator<R>,
        guard: &TimeBudgetGuard<C>,
    ) -> Result<TrialRecord>
    where
        R: ReferenceMetric,
        C: Clock,
    {
        let trial_id = self.resolve_trial(selection)?;
        let record = self.build_record(trial_id, evaluator, observable, metric, guard)?;
        self.persist(&record)?;
        Ok(record)
    }
}
