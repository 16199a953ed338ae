//! Time budget tests: cooperative stop and persistable partial histories
//!
//! Each iteration advances a `ManualClock` by a fixed cost, so the stop
//! iteration is exact.

use std::time::Duration;

use qtrial::monitor::{
    EnumerableModel, Fidelity, ManualClock, ObservableValues, PeriodicEvaluator,
    ReferenceMetricEvaluator, SamplingStatistics, StatSummary, TimeBudgetGuard, Trainer,
    TrainingCallback, TrainingLoop,
};
use qtrial::trial::{TrialAnalyzer, TrialLayout, TrialRecorder};
use qtrial::{SamplingConfig, TrialSelection};

struct Model {
    iteration: u64,
}

impl EnumerableModel for Model {
    fn num_states(&self) -> u128 {
        2
    }

    fn amplitudes(&self) -> Vec<f64> {
        vec![1.0, 1.0]
    }
}

/// Each step costs `cost` of simulated wall-clock time.
struct CostlyTrainer {
    model: Model,
    clock: ManualClock,
    cost: Duration,
}

impl Trainer<Model> for CostlyTrainer {
    fn step(&mut self, iteration: u64) -> qtrial::Result<()> {
        self.clock.advance(self.cost);
        self.model.iteration = iteration;
        Ok(())
    }

    fn model(&self) -> &Model {
        &self.model
    }
}

struct ConstantSampler;

impl SamplingStatistics<Model> for ConstantSampler {
    fn measure(
        &self,
        _model: &Model,
        observables: &[String],
        _config: &SamplingConfig,
    ) -> qtrial::Result<ObservableValues> {
        Ok(observables
            .iter()
            .map(|o| (o.clone(), StatSummary::new(-1.9, 0.01, 0.001)))
            .collect())
    }
}

fn trainer(clock: &ManualClock) -> CostlyTrainer {
    CostlyTrainer {
        model: Model { iteration: 0 },
        clock: clock.clone(),
        cost: Duration::from_secs(10),
    }
}

#[test]
fn test_stop_flag_set_at_iteration_six() {
    let clock = ManualClock::new();
    let mut guard = TimeBudgetGuard::with_clock(Duration::from_secs(60), 1, clock.clone()).unwrap();

    let outcome = TrainingLoop::new(1000)
        .run(&mut trainer(&clock), &mut [&mut guard])
        .unwrap();

    assert_eq!(outcome.iterations_completed, 6);
    assert!(outcome.stopped_early);
    assert!(guard.should_stop());
    assert_eq!(guard.runtimes_secs(), vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0]);
}

#[test]
fn test_guard_registered_first_still_lets_iteration_complete() {
    let clock = ManualClock::new();
    let mut guard = TimeBudgetGuard::with_clock(Duration::from_secs(60), 1, clock.clone()).unwrap();
    let mut evaluator =
        PeriodicEvaluator::new(1, ["energy"], SamplingConfig::default(), ConstantSampler).unwrap();

    let mut callbacks: [&mut dyn TrainingCallback<Model>; 2] = [&mut guard, &mut evaluator];
    TrainingLoop::new(1000)
        .run(&mut trainer(&clock), &mut callbacks)
        .unwrap();

    assert_eq!(evaluator.len(), 6);
    assert_eq!(guard.history().len(), 6);
}

#[test]
fn test_partial_histories_are_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new();
    let mut evaluator =
        PeriodicEvaluator::new(1, ["energy"], SamplingConfig::default(), ConstantSampler).unwrap();
    let mut metric = ReferenceMetricEvaluator::new(1, Fidelity, vec![1.0, 1.0]).unwrap();
    let mut guard = TimeBudgetGuard::with_clock(Duration::from_secs(60), 1, clock.clone()).unwrap();

    let mut callbacks: [&mut dyn TrainingCallback<Model>; 3] =
        [&mut evaluator, &mut metric, &mut guard];
    let outcome = TrainingLoop::new(1000)
        .run(&mut trainer(&clock), &mut callbacks)
        .unwrap();
    assert!(outcome.stopped_early);

    let layout = TrialLayout::new(dir.path(), 1);
    let recorder = TrialRecorder::new(layout.clone(), -2.0).unwrap();
    let record = recorder
        .record(TrialSelection::Explicit(1), &evaluator, "energy", &metric, &guard)
        .unwrap();
    assert_eq!(record.len(), 6);

    let loaded = TrialAnalyzer::new(layout).load(1).unwrap();
    assert_eq!(loaded.len(), 6);
    assert!((loaded.runtimes()[5] - 60.0).abs() < 1e-9);
    assert!((loaded.relative_errors()[0] - 0.05).abs() < 1e-6);
}
