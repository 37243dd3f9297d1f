//! Versioned record of promoted filter configurations.

use crate::domain::filter_config::FilterConfig;
use crate::domain::metrics::Metrics;
use chrono::NaiveDateTime;

/// One promotion. At most one entry is active at any time.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterHistory {
    pub id: i64,
    /// Monotonic per store, starting at 1.
    pub version: i64,
    pub config: FilterConfig,
    pub reason: String,
    /// Metrics that justified the promotion, when known.
    pub metrics: Option<Metrics>,
    pub active: bool,
    pub created_at: NaiveDateTime,
    pub deactivated_at: Option<NaiveDateTime>,
}
