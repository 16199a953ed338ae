//! Energy Trial Example
//!
//! Runs a few monitored trials of a toy wavefunction that relaxes toward
//! the ground state, persists one record per trial, then compares them.
//!
//! Run with: cargo run --example energy_trial -- [data_root] [qubits]

use std::cell::RefCell;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use qtrial::monitor::{
    EnumerableModel, Fidelity, ObservableValues, PeriodicEvaluator, ReferenceMetricEvaluator,
    SamplingStatistics, StatSummary, TimeBudgetGuard, Trainer, TrainingCallback, TrainingLoop,
};
use qtrial::trial::{
    load_reference_value, PlotSink, TrialAnalyzer, TrialLayout, TrialRecorder, TrialSeries,
};
use qtrial::{Error, MonitorConfig, SamplingConfig, TrialSelection};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;
use tracing_subscriber::EnvFilter;

const EPOCHS: u64 = 20;
const LEARNING_RATE: f64 = 0.2;

/// Positive wavefunction over `2^n` basis states.
struct ToyWavefunction {
    amplitudes: Vec<f64>,
    ground: Vec<f64>,
}

impl ToyWavefunction {
    #[allow(clippy::cast_precision_loss)]
    fn new(qubits: usize) -> Self {
        let states = 1usize << qubits;
        let ground: Vec<f64> = (0..states).map(|i| 1.0 + (i % 3) as f64).collect();
        Self {
            amplitudes: vec![1.0; states],
            ground,
        }
    }
}

impl EnumerableModel for ToyWavefunction {
    fn num_states(&self) -> u128 {
        self.amplitudes.len() as u128
    }

    fn amplitudes(&self) -> Vec<f64> {
        self.amplitudes.clone()
    }
}

/// Gradient-free stand-in for contrastive divergence.
struct RelaxationTrainer {
    model: ToyWavefunction,
}

impl Trainer<ToyWavefunction> for RelaxationTrainer {
    fn step(&mut self, _iteration: u64) -> qtrial::Result<()> {
        let model = &mut self.model;
        for (a, g) in model.amplitudes.iter_mut().zip(&model.ground) {
            *a += LEARNING_RATE * (g - *a);
        }
        std::thread::sleep(Duration::from_millis(5));
        Ok(())
    }

    fn model(&self) -> &ToyWavefunction {
        &self.model
    }
}

/// Energy estimate: exact energy scaled by fidelity plus sampling noise.
struct NoisyEnergySampler {
    ground_energy: f64,
    rng: RefCell<StdRng>,
}

impl SamplingStatistics<ToyWavefunction> for NoisyEnergySampler {
    #[allow(clippy::cast_precision_loss)]
    fn measure(
        &self,
        model: &ToyWavefunction,
        observables: &[String],
        config: &SamplingConfig,
    ) -> qtrial::Result<ObservableValues> {
        use qtrial::monitor::ReferenceMetric;

        let fidelity = Fidelity.compute(&model.amplitudes, &model.ground)?;
        let variance = 0.5 * (1.0 - fidelity) + 0.01;
        let std_error = (variance / config.num_samples as f64).sqrt();
        let noise = self.rng.borrow_mut().gen_range(-1.0..1.0) * std_error;
        let mean = self.ground_energy * fidelity + noise;

        Ok(observables
            .iter()
            .map(|name| (name.clone(), StatSummary::new(mean, variance, std_error)))
            .collect())
    }
}

/// Logs every series instead of drawing it.
struct LogSink;

impl PlotSink for LogSink {
    fn runtime_comparison(&mut self, target_index: usize, points: &[(u32, f64)]) -> qtrial::Result<()> {
        for (trial, runtime) in points {
            info!("RT for {} epochs, trial {trial}: {runtime:.3}s", target_index);
        }
        Ok(())
    }

    fn convergence(&mut self, series: &TrialSeries) -> qtrial::Result<()> {
        let last = series.fidelity.len().saturating_sub(1);
        info!(
            "Trial {} [{}]: fidelity {:.3} -> {:.3}, relative H error {:.6} -> {:.6}",
            series.trial,
            series.title(),
            series.fidelity.first().copied().unwrap_or_default(),
            series.fidelity.get(last).copied().unwrap_or_default(),
            series.relative_error.first().copied().unwrap_or_default(),
            series.relative_error.get(last).copied().unwrap_or_default(),
        );
        Ok(())
    }
}

fn seed_observables(layout: &TrialLayout) -> anyhow::Result<()> {
    let path = layout.observables_path();
    if !path.exists() {
        std::fs::create_dir_all(layout.samples_dir())?;
        #[allow(clippy::cast_precision_loss)]
        let energy = -1.616_025_4 * layout.qubits() as f64;
        std::fs::write(&path, format!("N Energy\n{} {energy}\n", layout.qubits()))?;
    }
    Ok(())
}

fn train_energy(layout: &TrialLayout, config: &MonitorConfig, seed: u64) -> anyhow::Result<u32> {
    config.validate()?;
    let reference = load_reference_value(layout.observables_path())
        .context("reading reference energy")?;

    let model = ToyWavefunction::new(config.qubits);
    let ground = model.ground.clone();
    let sampler = NoisyEnergySampler {
        ground_energy: reference,
        rng: RefCell::new(StdRng::seed_from_u64(seed)),
    };

    let mut evaluator = PeriodicEvaluator::new(config.period, ["Energy"], config.sampling, sampler)?
        .verbose(config.verbose);
    let mut metric = ReferenceMetricEvaluator::new(config.period, Fidelity, ground)?
        .max_states(config.max_enumerable_states)
        .verbose(config.verbose);
    let mut timer = TimeBudgetGuard::from_secs(config.max_time_secs, config.period)?
        .verbose(config.verbose);

    let mut trainer = RelaxationTrainer { model };
    let mut callbacks: [&mut dyn TrainingCallback<ToyWavefunction>; 3] =
        [&mut evaluator, &mut metric, &mut timer];
    let outcome = TrainingLoop::new(EPOCHS).run(&mut trainer, &mut callbacks)?;
    info!(
        iterations = outcome.iterations_completed,
        stopped_early = outcome.stopped_early,
        "training finished"
    );

    let recorder = TrialRecorder::new(layout.clone(), reference)?;
    let record = match recorder.record(config.trial, &evaluator, "Energy", &metric, &timer) {
        Err(Error::NoPriorTrial { .. }) => {
            info!("no prior trial, seeding trial 1");
            recorder.record(TrialSelection::Explicit(1), &evaluator, "Energy", &metric, &timer)?
        }
        other => other?,
    };
    Ok(record.trial_id())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let root = args
        .next()
        .map_or_else(|| std::env::temp_dir().join("qtrial-demo"), PathBuf::from);
    let qubits: usize = args.next().map_or(Ok(2), |q| q.parse()).context("qubits")?;

    println!("=== qtrial Energy Trials ===\n");
    let layout = TrialLayout::new(&root, qubits);
    seed_observables(&layout)?;

    let mut trials = Vec::new();
    for (seed, num_samples) in [(1, 100), (2, 1000), (3, 10_000)] {
        let config = MonitorConfig::new(qubits)
            .sampling(SamplingConfig::new(num_samples, 100, 100))
            .max_time_secs(30.0)
            .verbose(false);
        let trial = train_energy(&layout, &config, seed)?;
        println!("Trial {trial}: {}", layout.record_path(trial).display());
        trials.push(trial);
    }

    let (first, last) = (trials[0], trials[trials.len() - 1]);
    let comparison = TrialAnalyzer::new(layout).analyze(first..=last, 10)?;
    comparison.render(&mut LogSink)?;

    println!("\n=== Done ===");
    Ok(())
}
