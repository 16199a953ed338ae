//! On-disk layout of samples, reference observables and trial records

use std::path::{Path, PathBuf};

/// Ledger file name inside a record directory
pub(crate) const LEDGER_FILE: &str = "trials.json";

/// Paths for one system size under a data root.
///
/// ```text
/// <root>/Samples/<N>Q/{Samples,Amplitudes,Observables}.txt
/// <root>/Data/Energy/Q<N>/Trial<T>.txt    record
/// <root>/Data/Energy/Q<N>/Trial<T>        plot stem
/// <root>/Data/Energy/Q<N>/RTCompare       runtime comparison plot stem
/// <root>/Data/Energy/Q<N>/trials.json     trial ledger
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialLayout {
    root: PathBuf,
    qubits: usize,
}

impl TrialLayout {
    /// Layout for a `qubits`-qubit system under `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, qubits: usize) -> Self {
        Self {
            root: root.into(),
            qubits,
        }
    }

    /// Data root
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of qubits
    #[must_use]
    pub const fn qubits(&self) -> usize {
        self.qubits
    }

    /// Directory holding this system's input samples
    #[must_use]
    pub fn samples_dir(&self) -> PathBuf {
        self.root.join("Samples").join(format!("{}Q", self.qubits))
    }

    /// Training samples consumed by the external data loader
    #[must_use]
    pub fn samples_path(&self) -> PathBuf {
        self.samples_dir().join("Samples.txt")
    }

    /// Exact amplitudes consumed by the external data loader
    #[must_use]
    pub fn amplitudes_path(&self) -> PathBuf {
        self.samples_dir().join("Amplitudes.txt")
    }

    /// Exact observable values (reference energy on line 2)
    #[must_use]
    pub fn observables_path(&self) -> PathBuf {
        self.samples_dir().join("Observables.txt")
    }

    /// Directory holding trial records, plots and the ledger
    #[must_use]
    pub fn record_dir(&self) -> PathBuf {
        self.root
            .join("Data")
            .join("Energy")
            .join(format!("Q{}", self.qubits))
    }

    /// Record file of `trial`
    #[must_use]
    pub fn record_path(&self, trial: u32) -> PathBuf {
        self.record_dir().join(format!("Trial{trial}.txt"))
    }

    /// Plot stem of `trial` (the renderer picks the image suffix)
    #[must_use]
    pub fn plot_path(&self, trial: u32) -> PathBuf {
        self.record_dir().join(format!("Trial{trial}"))
    }

    /// Plot stem of the cross-trial runtime comparison
    #[must_use]
    pub fn comparison_plot_path(&self) -> PathBuf {
        self.record_dir().join("RTCompare")
    }

    /// Trial ledger file
    #[must_use]
    pub fn ledger_path(&self) -> PathBuf {
        self.record_dir().join(LEDGER_FILE)
    }
}

/// Trial number of a record file name such as `Trial12.txt`.
///
/// The whole digit run is the trial number; anything other than
/// `Trial<digits>.txt` yields `None`.
#[must_use]
pub fn parse_trial_number(file_name: &str) -> Option<u32> {
    let digits = file_name.strip_prefix("Trial")?.strip_suffix(".txt")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let layout = TrialLayout::new("/data", 4);
        assert_eq!(
            layout.record_path(12),
            PathBuf::from("/data/Data/Energy/Q4/Trial12.txt")
        );
        assert_eq!(layout.plot_path(3), PathBuf::from("/data/Data/Energy/Q4/Trial3"));
        assert_eq!(
            layout.comparison_plot_path(),
            PathBuf::from("/data/Data/Energy/Q4/RTCompare")
        );
        assert_eq!(
            layout.observables_path(),
            PathBuf::from("/data/Samples/4Q/Observables.txt")
        );
        assert_eq!(
            layout.samples_path(),
            PathBuf::from("/data/Samples/4Q/Samples.txt")
        );
        assert_eq!(
            layout.amplitudes_path(),
            PathBuf::from("/data/Samples/4Q/Amplitudes.txt")
        );
        assert_eq!(
            layout.ledger_path(),
            PathBuf::from("/data/Data/Energy/Q4/trials.json")
        );
    }

    #[test]
    fn test_parse_trial_number_uses_whole_digit_run() {
        assert_eq!(parse_trial_number("Trial1.txt"), Some(1));
        assert_eq!(parse_trial_number("Trial27.txt"), Some(27));
        assert_eq!(parse_trial_number("Trial105.txt"), Some(105));
    }

    #[test]
    fn test_parse_trial_number_rejects_other_files() {
        assert_eq!(parse_trial_number("Trial3.png"), None);
        assert_eq!(parse_trial_number("Trial3"), None);
        assert_eq!(parse_trial_number("Trial.txt"), None);
        assert_eq!(parse_trial_number("Trial1a.txt"), None);
        assert_eq!(parse_trial_number("RTCompare.png"), None);
        assert_eq!(parse_trial_number("trials.json"), None);
    }
}
