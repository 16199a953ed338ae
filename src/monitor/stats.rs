//! Statistical summaries and append-only evaluation history

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::SamplingConfig;
use crate::{Error, Result};

/// Sampled estimate of one observable at one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatSummary {
    /// Sample mean
    pub mean: f64,
    /// Sample variance
    pub variance: f64,
    /// Standard error of the mean
    pub std_error: f64,
}

impl StatSummary {
    /// Create a summary from its three moments.
    #[must_use]
    pub const fn new(mean: f64, variance: f64, std_error: f64) -> Self {
        Self {
            mean,
            variance,
            std_error,
        }
    }

    /// First non-finite moment as `(name, value)`, if any.
    #[must_use]
    pub fn non_finite(&self) -> Option<(&'static str, f64)> {
        [
            ("mean", self.mean),
            ("variance", self.variance),
            ("std_error", self.std_error),
        ]
        .into_iter()
        .find(|(_, v)| !v.is_finite())
    }
}

/// Observable name to summary, ordered by name for stable output.
pub type ObservableValues = BTreeMap<String, StatSummary>;

/// External sampling engine.
///
/// Draws samples from the model's represented distribution and summarises
/// each requested observable. Must not mutate the model.
pub trait SamplingStatistics<M> {
    /// Estimate every observable in `observables` under `config`.
    ///
    /// # Errors
    ///
    /// Implementations report sampler failures as `Error::Sampling`.
    fn measure(
        &self,
        model: &M,
        observables: &[String],
        config: &SamplingConfig,
    ) -> Result<ObservableValues>;
}

/// One evaluated iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry<T> {
    /// Training iteration the values were taken at
    pub iteration: u64,
    /// Values recorded at that iteration
    pub values: T,
}

/// Append-only, iteration-ordered evaluation history.
///
/// Entries are never mutated after append; only `reset` removes them.
#[derive(Debug, Clone, PartialEq)]
pub struct History<T> {
    entries: Vec<HistoryEntry<T>>,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> History<T> {
    /// Create an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the values recorded at `iteration`.
    ///
    /// # Errors
    ///
    /// Returns `Error::NonIncreasingIteration` if `iteration` is not
    /// strictly after the last recorded one.
    pub fn push(&mut self, iteration: u64, values: T) -> Result<()> {
        if let Some(last) = self.entries.last() {
            if iteration <= last.iteration {
                return Err(Error::NonIncreasingIteration {
                    iteration,
                    last: last.iteration,
                });
            }
        }
        self.entries.push(HistoryEntry { iteration, values });
        Ok(())
    }

    /// Most recent entry.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoHistory` if nothing has been recorded.
    pub fn latest(&self) -> Result<&HistoryEntry<T>> {
        self.entries.last().ok_or(Error::NoHistory)
    }

    /// Entry at `index`; negative indices count back from the end.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoHistory` on an empty history and
    /// `Error::IndexOutOfRange` for any other out-of-bounds index.
    pub fn get(&self, index: isize) -> Result<&HistoryEntry<T>> {
        if self.entries.is_empty() {
            return Err(Error::NoHistory);
        }
        let len = self.entries.len();
        let resolved = if index < 0 {
            len.checked_sub(index.unsigned_abs())
        } else {
            Some(index.unsigned_abs())
        };
        resolved
            .and_then(|i| self.entries.get(i))
            .ok_or(Error::IndexOutOfRange { index, len })
    }

    /// Remove every entry.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Number of recorded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in iteration order.
    pub fn iter(&self) -> std::slice::Iter<'_, HistoryEntry<T>> {
        self.entries.iter()
    }

    /// Recorded iterations in order.
    #[must_use]
    pub fn iterations(&self) -> Vec<u64> {
        self.entries.iter().map(|e| e.iteration).collect()
    }
}

impl<'a, T> IntoIterator for &'a History<T> {
    type Item = &'a HistoryEntry<T>;
    type IntoIter = std::slice::Iter<'a, HistoryEntry<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
