//! Optimization reports and their review workflow.

use crate::domain::error::BracketeerError;
use crate::domain::filter_config::FilterConfig;
use crate::domain::metrics::Metrics;
use crate::domain::window::Split;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Who decided a report's approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reviewer {
    Auto,
    Human,
}

impl Reviewer {
    pub fn as_str(self) -> &'static str {
        match self {
            Reviewer::Auto => "auto",
            Reviewer::Human => "human",
        }
    }
}

impl fmt::Display for Reviewer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Reviewer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Reviewer::Auto),
            "human" => Ok(Reviewer::Human),
            other => Err(format!("unknown reviewer '{}'", other)),
        }
    }
}

/// Baseline and candidate metrics for one window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub baseline: Metrics,
    pub candidate: Metrics,
}

/// Approval state; only these fields change after a report is written.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Approval {
    /// `None` while pending.
    pub approved: Option<bool>,
    pub approved_by: Option<Reviewer>,
    pub rejection_reason: Option<String>,
    pub reviewed_at: Option<NaiveDateTime>,
}

impl Approval {
    pub fn pending() -> Self {
        Approval::default()
    }

    pub fn is_pending(&self) -> bool {
        self.approved.is_none()
    }
}

/// One optimization run, as written by the walk-forward optimizer.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    pub created_at: NaiveDateTime,
    pub split: Split,
    pub symbols: Vec<String>,
    pub timeframes: Vec<String>,
    pub old_config: FilterConfig,
    pub new_config: FilterConfig,
    pub train: Comparison,
    pub test: Comparison,
    pub accepted: bool,
    pub significance: f64,
    pub reasoning: String,
    pub approval: Approval,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationReport {
    pub id: i64,
    pub record: NewReport,
}

impl OptimizationReport {
    /// A human may decide once; automatic decisions can still be overridden.
    pub fn ensure_reviewable(&self) -> Result<(), BracketeerError> {
        match self.record.approval.approved_by {
            Some(Reviewer::Human) => Err(BracketeerError::ReportAlreadyReviewed { id: self.id }),
            _ => Ok(()),
        }
    }

    pub fn status(&self) -> &'static str {
        match self.record.approval.approved {
            None => "pending",
            Some(true) => "approved",
            Some(false) => "rejected",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::window::Split;
    use chrono::NaiveDate;

    fn report(approval: Approval) -> OptimizationReport {
        let now = NaiveDate::from_ymd_opt(2024, 9, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        OptimizationReport {
            id: 5,
            record: NewReport {
                created_at: now,
                split: Split::ending_at(now, 21, 7),
                symbols: vec!["ES".into()],
                timeframes: vec!["5m".into()],
                old_config: FilterConfig::default(),
                new_config: FilterConfig::default(),
                train: Comparison::default(),
                test: Comparison::default(),
                accepted: false,
                significance: 0.5,
                reasoning: String::new(),
                approval,
            },
        }
    }

    #[test]
    fn pending_and_auto_reports_are_reviewable() {
        report(Approval::pending()).ensure_reviewable().unwrap();
        let auto = Approval {
            approved: Some(false),
            approved_by: Some(Reviewer::Auto),
            rejection_reason: Some("insufficient improvement on test window".into()),
            reviewed_at: None,
        };
        report(auto).ensure_reviewable().unwrap();
    }

    #[test]
    fn human_reviewed_report_is_locked() {
        let human = Approval {
            approved: Some(true),
            approved_by: Some(Reviewer::Human),
            rejection_reason: None,
            reviewed_at: None,
        };
        match report(human).ensure_reviewable() {
            Err(BracketeerError::ReportAlreadyReviewed { id }) => assert_eq!(id, 5),
            other => panic!("expected ReportAlreadyReviewed, got {:?}", other),
        }
    }

    #[test]
    fn status_reflects_approval() {
        assert_eq!(report(Approval::pending()).status(), "pending");
        let rejected = Approval {
            approved: Some(false),
            ..Approval::pending()
        };
        assert_eq!(report(rejected).status(), "rejected");
    }
}
