//! Periodic observable evaluation by sampling

use tracing::{debug, info};

use super::stats::{History, ObservableValues, SamplingStatistics, StatSummary};
use super::{CallbackAction, TrainingCallback};
use crate::config::SamplingConfig;
use crate::{Error, Result};

/// Samples the model every `period` iterations and keeps the statistics.
///
/// Register it before any callback that reads its history within the same
/// iteration; `TrainingLoop` calls callbacks in registration order.
#[derive(Debug)]
pub struct PeriodicEvaluator<S> {
    period: u64,
    observables: Vec<String>,
    sampling: SamplingConfig,
    sampler: S,
    verbose: bool,
    history: History<ObservableValues>,
}

impl<S> PeriodicEvaluator<S> {
    /// Create an evaluator for `observables`, sampled with `sampler`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` for a zero period, an empty observable
    /// list, or a sampling configuration that draws no samples.
    pub fn new<I, N>(period: u64, observables: I, sampling: SamplingConfig, sampler: S) -> Result<Self>
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        if period == 0 {
            return Err(Error::InvalidConfig("period must be at least 1".to_string()));
        }
        let observables: Vec<String> = observables.into_iter().map(Into::into).collect();
        if observables.is_empty() {
            return Err(Error::InvalidConfig(
                "at least one observable is required".to_string(),
            ));
        }
        sampling.validate()?;

        Ok(Self {
            period,
            observables,
            sampling,
            sampler,
            verbose: false,
            history: History::new(),
        })
    }

    /// Log one progress line per evaluation
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Evaluation period
    #[must_use]
    pub const fn period(&self) -> u64 {
        self.period
    }

    /// Tracked observable names
    #[must_use]
    pub fn observables(&self) -> &[String] {
        &self.observables
    }

    /// Sampling configuration handed to the sampler
    #[must_use]
    pub const fn sampling(&self) -> &SamplingConfig {
        &self.sampling
    }

    /// Full evaluation history
    #[must_use]
    pub const fn history(&self) -> &History<ObservableValues> {
        &self.history
    }

    /// Number of evaluated iterations
    #[must_use]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Whether nothing has been evaluated yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Statistics of every observable at the most recent evaluation.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoHistory` before the first evaluation.
    pub fn latest(&self) -> Result<&ObservableValues> {
        self.history.latest().map(|entry| &entry.values)
    }

    /// Statistics of `name` at history position `index` (negative from the end).
    ///
    /// # Errors
    ///
    /// Returns `Error::NoHistory` on an empty history,
    /// `Error::IndexOutOfRange` for a bad index, or
    /// `Error::UnknownObservable` if `name` is not tracked.
    pub fn get(&self, name: &str, index: isize) -> Result<StatSummary> {
        let entry = self.history.get(index)?;
        entry
            .values
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownObservable(name.to_string()))
    }

    /// Statistics of `name` at every evaluated iteration, in order.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownObservable` if `name` is not tracked.
    pub fn series(&self, name: &str) -> Result<Vec<StatSummary>> {
        if !self.observables.iter().any(|o| o == name) {
            return Err(Error::UnknownObservable(name.to_string()));
        }
        self.history
            .iter()
            .map(|entry| {
                entry
                    .values
                    .get(name)
                    .copied()
                    .ok_or_else(|| Error::UnknownObservable(name.to_string()))
            })
            .collect()
    }

    /// Discard all recorded statistics.
    pub fn reset(&mut self) {
        self.history.reset();
    }
}

impl<M, S: SamplingStatistics<M>> TrainingCallback<M> for PeriodicEvaluator<S> {
    fn on_iteration_end(&mut self, model: &M, iteration: u64) -> Result<CallbackAction> {
        if iteration % self.period != 0 {
            return Ok(CallbackAction::Continue);
        }

        let values = self.sampler.measure(model, &self.observables, &self.sampling)?;
        if let Some(missing) = self.observables.iter().find(|o| !values.contains_key(*o)) {
            return Err(Error::UnknownObservable(missing.clone()));
        }
        for (name, stat) in &values {
            if let Some((moment, value)) = stat.non_finite() {
                return Err(Error::NonFiniteValue {
                    what: format!("{name} {moment} at iteration {iteration}"),
                    value,
                });
            }
        }

        if self.verbose {
            info!("{}", format_progress_line(iteration, &values));
        }
        debug!(iteration, observables = values.len(), "observables evaluated");

        self.history.push(iteration, values)?;
        Ok(CallbackAction::Continue)
    }

    fn name(&self) -> &'static str {
        "PeriodicEvaluator"
    }
}

/// Progress line for one evaluation: `Epoch: <n>\t<name> = <mean>` per observable.
#[must_use]
pub fn format_progress_line(iteration: u64, values: &ObservableValues) -> String {
    let stats = values
        .iter()
        .map(|(name, stat)| format!("{name} = {:.6}", stat.mean))
        .collect::<Vec<_>>()
        .join("\t");
    format!("Epoch: {iteration}\t{stats}")
}
