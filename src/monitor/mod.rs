//! Training-time monitoring callbacks
//!
//! ## Callback Flow
//!
//! ```text
//! TrainingLoop ──step──> Trainer (external learning rule)
//!      │
//!      └──on_iteration_end──> PeriodicEvaluator       ──> History<ObservableValues>
//!                             ReferenceMetricEvaluator ──> History<f64>
//!                             TimeBudgetGuard          ──> elapsed times + stop flag
//! ```
//!
//! Callbacks are borrowed by the loop, so the caller keeps a named handle
//! to each one and reads its history after training without depending on
//! registration order.
//!
//! ## Usage
//!
//! ```rust
//! use qtrial::monitor::{CallbackAction, Trainer, TrainingCallback, TrainingLoop};
//!
//! struct Counter(u64);
//!
//! impl Trainer<u64> for Counter {
//!     fn step(&mut self, _iteration: u64) -> qtrial::Result<()> {
//!         self.0 += 1;
//!         Ok(())
//!     }
//!     fn model(&self) -> &u64 {
//!         &self.0
//!     }
//! }
//!
//! struct StopAtThree;
//!
//! impl TrainingCallback<u64> for StopAtThree {
//!     fn on_iteration_end(&mut self, _model: &u64, iteration: u64) -> qtrial::Result<CallbackAction> {
//!         Ok(if iteration >= 3 { CallbackAction::Stop } else { CallbackAction::Continue })
//!     }
//!     fn name(&self) -> &'static str {
//!         "StopAtThree"
//!     }
//! }
//!
//! let mut trainer = Counter(0);
//! let mut stop = StopAtThree;
//! let outcome = TrainingLoop::new(100).run(&mut trainer, &mut [&mut stop])?;
//! assert_eq!(outcome.iterations_completed, 3);
//! assert!(outcome.stopped_early);
//! # Ok::<(), qtrial::Error>(())
//! ```

pub mod metric;
pub mod observable;
pub mod stats;
pub mod timer;

pub use metric::{EnumerableModel, Fidelity, ReferenceMetric, ReferenceMetricEvaluator};
pub use observable::{format_progress_line, PeriodicEvaluator};
pub use stats::{History, HistoryEntry, ObservableValues, SamplingStatistics, StatSummary};
pub use timer::{Clock, ManualClock, MonotonicClock, TimeBudgetGuard};

use tracing::{debug, info};

use crate::{Error, Result};

/// Action a callback requests after an iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    /// Keep training
    Continue,
    /// Stop before the next iteration begins
    Stop,
}

/// Hook invoked by `TrainingLoop` at iteration boundaries.
pub trait TrainingCallback<M> {
    /// Called once before the first iteration.
    ///
    /// # Errors
    ///
    /// Any error aborts training before it starts.
    fn on_train_begin(&mut self, _model: &M) -> Result<()> {
        Ok(())
    }

    /// Called after the model update of `iteration` (1-based).
    ///
    /// # Errors
    ///
    /// Any error aborts training and propagates to the caller.
    fn on_iteration_end(&mut self, model: &M, iteration: u64) -> Result<CallbackAction>;

    /// Callback name for logging
    fn name(&self) -> &'static str;
}

/// External learning rule driven by `TrainingLoop`.
pub trait Trainer<M> {
    /// Perform the parameter update for `iteration`.
    ///
    /// # Errors
    ///
    /// Training errors propagate out of `TrainingLoop::run`.
    fn step(&mut self, iteration: u64) -> Result<()>;

    /// Current model snapshot.
    fn model(&self) -> &M;
}

/// Summary of a finished training run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainingOutcome {
    /// Iterations whose update and callbacks all completed
    pub iterations_completed: u64,
    /// Whether a callback stopped training before `max_iterations`
    pub stopped_early: bool,
}

/// Synchronous training driver.
///
/// Every callback sees every completed iteration, in registration order.
/// A stop request takes effect only after the whole iteration finished.
#[derive(Debug, Clone, Copy)]
pub struct TrainingLoop {
    max_iterations: u64,
}

impl TrainingLoop {
    /// Create a loop running at most `max_iterations` iterations.
    #[must_use]
    pub const fn new(max_iterations: u64) -> Self {
        Self { max_iterations }
    }

    /// Maximum number of iterations
    #[must_use]
    pub const fn max_iterations(&self) -> u64 {
        self.max_iterations
    }

    /// Run training to completion or until a callback asks to stop.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` for a zero iteration count, and
    /// propagates trainer or callback errors unchanged.
    pub fn run<M, T>(
        &self,
        trainer: &mut T,
        callbacks: &mut [&mut dyn TrainingCallback<M>],
    ) -> Result<TrainingOutcome>
    where
        T: Trainer<M> + ?Sized,
    {
        if self.max_iterations == 0 {
            return Err(Error::InvalidConfig(
                "max_iterations must be at least 1".to_string(),
            ));
        }

        for cb in callbacks.iter_mut() {
            cb.on_train_begin(trainer.model())?;
        }

        for iteration in 1..=self.max_iterations {
            trainer.step(iteration)?;

            let mut stop_requested_by = None;
            for cb in callbacks.iter_mut() {
                if cb.on_iteration_end(trainer.model(), iteration)? == CallbackAction::Stop
                    && stop_requested_by.is_none()
                {
                    stop_requested_by = Some(cb.name());
                }
            }

            if let Some(name) = stop_requested_by {
                info!(iteration, callback = name, "training stopped by callback");
                return Ok(TrainingOutcome {
                    iterations_completed: iteration,
                    stopped_early: iteration < self.max_iterations,
                });
            }
            debug!(iteration, "iteration complete");
        }

        Ok(TrainingOutcome {
            iterations_completed: self.max_iterations,
            stopped_early: false,
        })
    }
}
