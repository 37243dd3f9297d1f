//! Half-open time windows and train/test splits.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::bar::TIMESTAMP_FORMAT;

/// `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        TimeWindow { start, end }
    }

    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        self.start <= ts && ts < self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {})",
            self.start.format(TIMESTAMP_FORMAT),
            self.end.format(TIMESTAMP_FORMAT)
        )
    }
}

/// A train window immediately followed by a disjoint test window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub train: TimeWindow,
    pub test: TimeWindow,
}

impl Split {
    /// The split whose test window ends at `end`.
    pub fn ending_at(end: NaiveDateTime, train_days: i64, test_days: i64) -> Self {
        let test_start = end - Duration::days(test_days);
        let train_start = test_start - Duration::days(train_days);
        Split {
            train: TimeWindow::new(train_start, test_start),
            test: TimeWindow::new(test_start, end),
        }
    }

    /// Whole span covered by both windows.
    pub fn span(&self) -> TimeWindow {
        TimeWindow::new(self.train.start, self.test.end)
    }
}
