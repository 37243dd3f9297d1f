//! Per-batch bookkeeping shared by every pipeline stage.

use std::fmt;
use std::ops::AddAssign;

/// Counts reported by a batch stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Records written.
    pub processed: usize,
    /// Inputs rejected for good (duplicates, insufficient history, failed decisions).
    pub skipped: usize,
    /// Inputs left for a later run once more data exists.
    pub deferred: usize,
}

impl AddAssign for BatchSummary {
    fn add_assign(&mut self, rhs: Self) {
        self.processed += rhs.processed;
        self.skipped += rhs.skipped;
        self.deferred += rhs.deferred;
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} processed, {} skipped, {} deferred",
            self.processed, self.skipped, self.deferred
        )
    }
}
