//! Wall-clock training budget
//!
//! Cancellation is cooperative: the guard only returns `CallbackAction::Stop`
//! and raises its stop flag; the running iteration always completes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use super::stats::History;
use super::{CallbackAction, TrainingCallback};
use crate::{Error, Result};

/// Monotonic time source, as an offset from an arbitrary fixed origin.
pub trait Clock {
    /// Current offset from the clock's origin
    fn now(&self) -> Duration;
}

/// Real wall-clock time backed by `Instant`.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Clock whose origin is the moment of construction
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manually advanced clock for simulating training cost.
///
/// Clones share the same time, so a trainer can advance the clock a guard reads.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    /// Clock starting at zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward by `by`
    pub fn advance(&self, by: Duration) {
        let nanos = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.fetch_add(nanos, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

/// Stops training once elapsed wall-clock time reaches a budget.
///
/// Elapsed time is recorded on every checked iteration
/// (`iteration % period == 0`) and later serves as the runtime column
/// of a trial record.
#[derive(Debug)]
pub struct TimeBudgetGuard<C = MonotonicClock> {
    max_time: Duration,
    period: u64,
    clock: C,
    start: Option<Duration>,
    elapsed: History<Duration>,
    stopped: bool,
    verbose: bool,
}

impl TimeBudgetGuard<MonotonicClock> {
    /// Guard backed by the real monotonic clock.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` for a zero budget or zero period.
    pub fn new(max_time: Duration, period: u64) -> Result<Self> {
        Self::with_clock(max_time, period, MonotonicClock::new())
    }

    /// Guard with the budget given in (fractional) seconds.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` for a non-finite or non-positive budget.
    pub fn from_secs(max_time_secs: f64, period: u64) -> Result<Self> {
        let max_time = Duration::try_from_secs_f64(max_time_secs).map_err(|e| {
            Error::InvalidConfig(format!("invalid time budget {max_time_secs}: {e}"))
        })?;
        Self::new(max_time, period)
    }
}

impl<C: Clock> TimeBudgetGuard<C> {
    /// Guard reading time from `clock`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` for a zero budget or zero period.
    pub fn with_clock(max_time: Duration, period: u64, clock: C) -> Result<Self> {
        if max_time.is_zero() {
            return Err(Error::InvalidConfig("max_time must be positive".to_string()));
        }
        if period == 0 {
            return Err(Error::InvalidConfig("period must be at least 1".to_string()));
        }
        Ok(Self {
            max_time,
            period,
            clock,
            start: None,
            elapsed: History::new(),
            stopped: false,
            verbose: false,
        })
    }

    /// Log elapsed time on every checked iteration
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Configured budget
    #[must_use]
    pub const fn max_time(&self) -> Duration {
        self.max_time
    }

    /// Whether the budget has been exhausted
    #[must_use]
    pub const fn should_stop(&self) -> bool {
        self.stopped
    }

    /// Elapsed time at every checked iteration
    #[must_use]
    pub const fn history(&self) -> &History<Duration> {
        &self.elapsed
    }

    /// Elapsed time at the `index`-th checked iteration (negative from the end).
    ///
    /// # Errors
    ///
    /// Returns `Error::NoHistory` or `Error::IndexOutOfRange`.
    pub fn elapsed_at_iteration(&self, index: isize) -> Result<Duration> {
        self.elapsed.get(index).map(|e| e.values)
    }

    /// Elapsed seconds at every checked iteration, in order
    #[must_use]
    pub fn runtimes_secs(&self) -> Vec<f64> {
        self.elapsed.iter().map(|e| e.values.as_secs_f64()).collect()
    }

    /// Clear the recorded history, the start time and the stop flag.
    ///
    /// Histories are kept across runs until this is called, as with the
    /// evaluators.
    pub fn reset(&mut self) {
        self.start = None;
        self.elapsed.reset();
        self.stopped = false;
    }

    fn start(&mut self) -> Duration {
        *self.start.get_or_insert_with(|| self.clock.now())
    }
}

impl<M, C: Clock> TrainingCallback<M> for TimeBudgetGuard<C> {
    fn on_train_begin(&mut self, _model: &M) -> Result<()> {
        self.start = Some(self.clock.now());
        Ok(())
    }

    fn on_iteration_end(&mut self, _model: &M, iteration: u64) -> Result<CallbackAction> {
        let start = self.start();
        if iteration % self.period != 0 {
            return Ok(if self.stopped {
                CallbackAction::Stop
            } else {
                CallbackAction::Continue
            });
        }

        let elapsed = self.clock.now().saturating_sub(start);
        self.elapsed.push(iteration, elapsed)?;
        if self.verbose {
            info!("Epoch: {iteration}\tElapsed = {:.3}s", elapsed.as_secs_f64());
        }

        if elapsed >= self.max_time {
            if !self.stopped {
                warn!(
                    iteration,
                    elapsed_secs = elapsed.as_secs_f64(),
                    max_secs = self.max_time.as_secs_f64(),
                    "time budget exhausted, stopping after this iteration"
                );
            }
            self.stopped = true;
        }

        Ok(if self.stopped {
            CallbackAction::Stop
        } else {
            CallbackAction::Continue
        })
    }

    fn name(&self) -> &'static str {
        "TimeBudgetGuard"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard(max_secs: u64, period: u64) -> (TimeBudgetGuard<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let guard =
            TimeBudgetGuard::with_clock(Duration::from_secs(max_secs), period, clock.clone())
                .unwrap();
        (guard, clock)
    }

    #[test]
    fn test_stops_when_budget_reached() {
        let (mut guard, clock) = guard(60, 1);
        TrainingCallback::<()>::on_train_begin(&mut guard, &()).unwrap();

        let mut stopped_at = None;
        for it in 1..=10 {
            clock.advance(Duration::from_secs(10));
            if guard.on_iteration_end(&(), it).unwrap() == CallbackAction::Stop {
                stopped_at = Some(it);
                break;
            }
        }

        assert_eq!(stopped_at, Some(6));
        assert!(guard.should_stop());
        assert_eq!(guard.elapsed_at_iteration(-1).unwrap(), Duration::from_secs(60));
        assert_eq!(guard.elapsed_at_iteration(0).unwrap(), Duration::from_secs(10));
        assert_eq!(guard.runtimes_secs().len(), 6);
    }

    #[test]
    fn test_start_taken_at_first_invocation_without_begin() {
        let (mut guard, clock) = guard(60, 1);
        clock.advance(Duration::from_secs(100));
        assert_eq!(
            guard.on_iteration_end(&(), 1).unwrap(),
            CallbackAction::Continue
        );
        assert_eq!(guard.elapsed_at_iteration(0).unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_records_only_checked_iterations() {
        let (mut guard, clock) = guard(1000, 5);
        TrainingCallback::<()>::on_train_begin(&mut guard, &()).unwrap();
        for it in 1..=12 {
            clock.advance(Duration::from_secs(1));
            guard.on_iteration_end(&(), it).unwrap();
        }
        assert_eq!(guard.history().iterations(), vec![5, 10]);
        assert_eq!(guard.runtimes_secs(), vec![5.0, 10.0]);
    }

    #[test]
    fn test_rejects_invalid_budget() {
        assert!(TimeBudgetGuard::new(Duration::ZERO, 1).is_err());
        assert!(TimeBudgetGuard::new(Duration::from_secs(1), 0).is_err());
        assert!(TimeBudgetGuard::from_secs(-1.0, 1).is_err());
        assert!(TimeBudgetGuard::from_secs(f64::NAN, 1).is_err());
        assert!(TimeBudgetGuard::from_secs(1.5, 1).is_ok());
    }

    #[test]
    fn test_history_survives_begin_until_reset() {
        let (mut guard, clock) = guard(15, 1);
        TrainingCallback::<()>::on_train_begin(&mut guard, &()).unwrap();
        for it in 1..=2 {
            clock.advance(Duration::from_secs(10));
            guard.on_iteration_end(&(), it).unwrap();
        }
        assert!(guard.should_stop());

        TrainingCallback::<()>::on_train_begin(&mut guard, &()).unwrap();
        assert_eq!(guard.history().iterations(), vec![1, 2]);
        assert!(guard.should_stop());

        guard.reset();
        assert!(guard.history().is_empty());
        assert!(!guard.should_stop());

        TrainingCallback::<()>::on_train_begin(&mut guard, &()).unwrap();
        clock.advance(Duration::from_secs(4));
        assert_eq!(
            guard.on_iteration_end(&(), 1).unwrap(),
            CallbackAction::Continue
        );
        assert_eq!(guard.runtimes_secs(), vec![4.0]);
    }

    #[test]
    fn test_elapsed_lookup_errors() {
        let (guard, _clock) = guard(10, 1);
        assert!(matches!(guard.elapsed_at_iteration(0), Err(Error::NoHistory)));
    }
}
