//! Trial ledger - persisted index of recorded trials
//!
//! The ledger is the source of truth for automatic trial numbering and for
//! the expected row count of each record.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;

/// One recorded trial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Trial number
    pub trial: u32,
    /// Rows written to the record
    pub rows: usize,
    /// When the record was written
    pub recorded_at: DateTime<Utc>,
}

/// Index of every trial recorded in one directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialLedger {
    entries: Vec<LedgerEntry>,
}

impl TrialLedger {
    /// Empty ledger
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the ledger at `path`, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the ledger to `path`, replacing the previous file whole.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or any filesystem step fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Record `trial` with `rows` rows, replacing an earlier entry for it.
    pub fn record(&mut self, trial: u32, rows: usize) {
        self.entries.retain(|e| e.trial != trial);
        self.entries.push(LedgerEntry {
            trial,
            rows,
            recorded_at: Utc::now(),
        });
        self.entries.sort_by_key(|e| e.trial);
    }

    /// Entries ordered by trial number
    #[must_use]
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Entry for `trial`
    #[must_use]
    pub fn get(&self, trial: u32) -> Option<&LedgerEntry> {
        self.entries.iter().find(|e| e.trial == trial)
    }

    /// Highest recorded trial, `None` if the ledger is empty
    #[must_use]
    pub fn highest_trial(&self) -> Option<u32> {
        self.entries.iter().map(|e| e.trial).max()
    }

    /// Whether no trial has been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
