//! # qtrial: Training Monitor and Trial Analytics for Neural Quantum States
//!
//! qtrial watches an iterative stochastic training run, samples physical
//! observables on a fixed period, bounds the run's wall-clock time, persists
//! one record per trial and compares many trials offline.
//!
//! ## Pipeline
//!
//! ```text
//! TrainingLoop ──> PeriodicEvaluator        (sampled observables)
//!              ──> ReferenceMetricEvaluator (exact fidelity)
//!              ──> TimeBudgetGuard          (runtime + stop flag)
//!                        │
//!                        ▼
//!                  TrialRecorder ──> Data/Energy/Q<N>/Trial<T>.txt
//!                                          │
//!                                          ▼
//!                                   TrialAnalyzer ──> PlotSink
//! ```
//!
//! The model, its learning rule and the sampler are external: they plug in
//! through the `Trainer`, `SamplingStatistics` and `EnumerableModel` traits.
//!
//! ## Example
//!
//! ```rust,no_run
//! use qtrial::trial::{TrialAnalyzer, TrialLayout};
//!
//! let analyzer = TrialAnalyzer::new(TrialLayout::new(".", 4));
//! let comparison = analyzer.analyze(1..=27, 10)?;
//! for (trial, runtime) in &comparison.runtime_at_target {
//!     println!("Trial {trial}: {runtime:.3}s for 10 epochs");
//! }
//! # Ok::<(), qtrial::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod config;
pub mod error;
pub mod monitor;
pub mod trial;

pub use config::{MonitorConfig, SamplingConfig, TrialSelection};
pub use error::{Error, Result};
