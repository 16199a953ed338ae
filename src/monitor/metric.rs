//! Exact reference metrics by full state-space enumeration
//!
//! Only tractable for small systems: the evaluator refuses to enumerate
//! a state space larger than its configured limit.

use tracing::{debug, info};

use super::stats::History;
use super::{CallbackAction, TrainingCallback};
use crate::config::DEFAULT_MAX_ENUMERABLE_STATES;
use crate::{Error, Result};

/// Model whose full basis can be enumerated.
pub trait EnumerableModel {
    /// Number of basis states (2^n for n binary units).
    fn num_states(&self) -> u128;

    /// Amplitude of every basis state, in basis order.
    fn amplitudes(&self) -> Vec<f64>;
}

/// Exact comparison between model and reference amplitudes.
pub trait ReferenceMetric {
    /// Metric name, e.g. "Fidelity"
    fn name(&self) -> &str;

    /// Compute the metric.
    ///
    /// # Errors
    ///
    /// Implementations reject vectors they cannot compare.
    fn compute(&self, model: &[f64], reference: &[f64]) -> Result<f64>;
}

/// Squared overlap `|<psi|phi>|^2` of the normalised amplitude vectors.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fidelity;

impl ReferenceMetric for Fidelity {
    fn name(&self) -> &str {
        "Fidelity"
    }

    fn compute(&self, model: &[f64], reference: &[f64]) -> Result<f64> {
        if model.len() != reference.len() {
            return Err(Error::InvalidConfig(format!(
                "model has {} amplitudes, reference has {}",
                model.len(),
                reference.len()
            )));
        }
        let overlap: f64 = model.iter().zip(reference).map(|(a, b)| a * b).sum();
        let norm_model: f64 = model.iter().map(|a| a * a).sum();
        let norm_reference: f64 = reference.iter().map(|b| b * b).sum();
        if norm_model <= 0.0 || norm_reference <= 0.0 {
            return Err(Error::InvalidConfig(
                "fidelity of a zero-norm amplitude vector is undefined".to_string(),
            ));
        }
        Ok(overlap * overlap / (norm_model * norm_reference))
    }
}

/// Evaluates a reference metric every `period` iterations.
#[derive(Debug)]
pub struct ReferenceMetricEvaluator<R> {
    period: u64,
    metric: R,
    reference: Vec<f64>,
    max_states: u64,
    verbose: bool,
    history: History<f64>,
}

impl<R: ReferenceMetric> ReferenceMetricEvaluator<R> {
    /// Create an evaluator comparing against `reference` amplitudes.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` for a zero period or an empty reference.
    pub fn new(period: u64, metric: R, reference: Vec<f64>) -> Result<Self> {
        if period == 0 {
            return Err(Error::InvalidConfig("period must be at least 1".to_string()));
        }
        if reference.is_empty() {
            return Err(Error::InvalidConfig(
                "reference distribution is empty".to_string(),
            ));
        }
        Ok(Self {
            period,
            metric,
            reference,
            max_states: DEFAULT_MAX_ENUMERABLE_STATES,
            verbose: false,
            history: History::new(),
        })
    }

    /// Set the largest state space that may be enumerated
    #[must_use]
    pub const fn max_states(mut self, limit: u64) -> Self {
        self.max_states = limit;
        self
    }

    /// Log one progress line per evaluation
    #[must_use]
    pub const fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Metric name
    #[must_use]
    pub fn metric_name(&self) -> &str {
        self.metric.name()
    }

    /// Evaluation period
    #[must_use]
    pub const fn period(&self) -> u64 {
        self.period
    }

    /// Full evaluation history
    #[must_use]
    pub const fn history(&self) -> &History<f64> {
        &self.history
    }

    /// Metric value at every evaluated iteration, in order
    #[must_use]
    pub fn values(&self) -> Vec<f64> {
        self.history.iter().map(|e| e.values).collect()
    }

    /// Most recent metric value.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoHistory` before the first evaluation.
    pub fn latest(&self) -> Result<f64> {
        self.history.latest().map(|e| e.values)
    }

    /// Metric value at history position `index` (negative from the end).
    ///
    /// # Errors
    ///
    /// Returns `Error::NoHistory` or `Error::IndexOutOfRange`.
    pub fn get(&self, index: isize) -> Result<f64> {
        self.history.get(index).map(|e| e.values)
    }

    /// Discard all recorded values.
    pub fn reset(&mut self) {
        self.history.reset();
    }

    fn check_tractable<M: EnumerableModel>(&self, model: &M) -> Result<()> {
        let states = model.num_states();
        let limit = u128::from(self.max_states);
        if states > limit {
            return Err(Error::IntractableStateSpace { states, limit });
        }
        Ok(())
    }
}

impl<M: EnumerableModel, R: ReferenceMetric> TrainingCallback<M> for ReferenceMetricEvaluator<R> {
    fn on_train_begin(&mut self, model: &M) -> Result<()> {
        self.check_tractable(model)
    }

    fn on_iteration_end(&mut self, model: &M, iteration: u64) -> Result<CallbackAction> {
        if iteration % self.period != 0 {
            return Ok(CallbackAction::Continue);
        }
        self.check_tractable(model)?;

        let value = self.metric.compute(&model.amplitudes(), &self.reference)?;
        if !value.is_finite() {
            return Err(Error::NonFiniteValue {
                what: format!("{} at iteration {iteration}", self.metric.name()),
                value,
            });
        }
        if self.verbose {
            info!("Epoch: {iteration}\t{} = {value:.6}", self.metric.name());
        }
        debug!(iteration, metric = self.metric.name(), value, "reference metric evaluated");

        self.history.push(iteration, value)?;
        Ok(CallbackAction::Continue)
    }

    fn name(&self) -> &'static str {
        "ReferenceMetricEvaluator"
    }
}
