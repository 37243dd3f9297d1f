//! Configuration store port: the single active filter configuration.

use crate::domain::error::BracketeerError;
use crate::domain::filter_config::FilterConfig;
use crate::domain::filter_history::FilterHistory;
use crate::domain::metrics::Metrics;

pub trait FilterStorePort {
    /// The active entry, if any has been promoted.
    fn active_filter(&self) -> Result<Option<FilterHistory>, BracketeerError>;

    /// Deactivate every prior entry and activate `config` as a new version.
    fn promote(
        &self,
        config: &FilterConfig,
        reason: &str,
        metrics: Option<&Metrics>,
    ) -> Result<FilterHistory, BracketeerError>;

    /// All entries, newest first.
    fn filter_history(&self) -> Result<Vec<FilterHistory>, BracketeerError>;

    /// The active configuration, or `seed` when nothing has been promoted.
    fn active_config(&self, seed: &FilterConfig) -> Result<FilterConfig, BracketeerError> {
        Ok(self
            .active_filter()?
            .map(|h| h.config)
            .unwrap_or_else(|| seed.clone()))
    }
}
