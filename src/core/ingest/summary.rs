//! Scan cycle summaries

use std::fmt;
use std::time::Duration;

/// Which cycle ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanMode {
    /// Every department of every hospital, schedule only
    Full,
    /// Tracked departments with live progress
    Tracked,
    /// One-shot live refresh of today's subscriptions
    MorningSync,
}

impl ScanMode {
    /// Name used in logs and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanMode::Full => "full",
            ScanMode::Tracked => "tracked",
            ScanMode::MorningSync => "morning-sync",
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one write through the snapshot writer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Rows handed to the writer
    pub rows_received: usize,
    /// Rows dropped because a later row had the same key
    pub duplicates_merged: usize,
    /// Rows the store accepted
    pub rows_written: usize,
    /// Batches attempted
    pub batches: usize,
    /// Batches the store rejected
    pub failed_batches: usize,
    /// One message per failed batch
    pub errors: Vec<String>,
}

impl WriteSummary {
    /// Fold another write into this one
    pub fn merge(&mut self, other: WriteSummary) {
        self.rows_received += other.rows_received;
        self.duplicates_merged += other.duplicates_merged;
        self.rows_written += other.rows_written;
        self.batches += other.batches;
        self.failed_batches += other.failed_batches;
        self.errors.extend(other.errors);
    }
}

/// Per-hospital counts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HospitalScan {
    /// Hospital code
    pub hospital: String,
    /// Departments scraped
    pub departments: usize,
    /// Slots parsed from schedules
    pub slots: usize,
    /// Live progress fetches that returned data
    pub live_fetches: usize,
    /// Departments or doctors skipped after an error
    pub skipped_units: usize,
    /// Store writes
    pub writes: WriteSummary,
    /// Errors that ended or degraded this hospital's scan
    pub errors: Vec<String>,
}

impl HospitalScan {
    /// Empty counts for a hospital
    pub fn new(hospital: impl Into<String>) -> Self {
        Self {
            hospital: hospital.into(),
            ..Self::default()
        }
    }

    /// Record an error for a unit that was skipped
    pub fn skip(&mut self, error: String) {
        self.skipped_units += 1;
        self.errors.push(error);
    }
}

/// Summary of one scan cycle
#[derive(Debug, Clone)]
pub struct ScanSummary {
    /// Cycle that ran
    pub mode: ScanMode,
    /// One entry per hospital attempted
    pub hospitals: Vec<HospitalScan>,
    /// Alerts fired by the notification run that followed, if any
    pub alerts_fired: usize,
    /// Errors outside any one hospital
    pub errors: Vec<String>,
    /// Wall time of the cycle
    pub duration: Duration,
}

impl ScanSummary {
    /// Empty summary for a mode
    pub fn new(mode: ScanMode) -> Self {
        Self {
            mode,
            hospitals: Vec::new(),
            alerts_fired: 0,
            errors: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    /// Total rows written across hospitals
    pub fn rows_written(&self) -> usize {
        self.hospitals.iter().map(|h| h.writes.rows_written).sum()
    }

    /// Whether anything in the cycle failed
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
            || self
                .hospitals
                .iter()
                .any(|h| !h.errors.is_empty() || h.writes.failed_batches > 0)
    }

    /// Every error message, hospital errors prefixed with the hospital code
    pub fn all_errors(&self) -> Vec<String> {
        self.hospitals
            .iter()
            .flat_map(|h| {
                h.errors
                    .iter()
                    .chain(h.writes.errors.iter())
                    .map(move |e| format!("[{}] {e}", h.hospital))
            })
            .chain(self.errors.iter().cloned())
            .collect()
    }
}
