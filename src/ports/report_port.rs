//! Optimization report storage port.

use crate::domain::error::BracketeerError;
use crate::domain::report::{Approval, NewReport, OptimizationReport};

pub trait ReportPort {
    fn insert_report(&self, report: &NewReport) -> Result<i64, BracketeerError>;

    fn report(&self, id: i64) -> Result<Option<OptimizationReport>, BracketeerError>;

    /// Newest first.
    fn reports(&self, limit: usize) -> Result<Vec<OptimizationReport>, BracketeerError>;

    /// Overwrite only the approval fields of report `id`.
    fn record_review(&self, id: i64, approval: &Approval) -> Result<(), BracketeerError>;
}
