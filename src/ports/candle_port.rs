//! Candle store port.

use crate::domain::bar::Bar;
use crate::domain::error::BracketeerError;
use crate::domain::window::TimeWindow;
use chrono::NaiveDateTime;

/// Read access to stored bars, plus the insert path used by CSV import.
pub trait CandlePort {
    /// Bars of one series in ascending time order, from `since` (inclusive).
    fn get_bars(
        &self,
        symbol: &str,
        timeframe: &str,
        since: Option<NaiveDateTime>,
        limit: Option<usize>,
    ) -> Result<Vec<Bar>, BracketeerError>;

    /// Up to `limit` bars strictly after `after`, ascending.
    fn bars_after(
        &self,
        symbol: &str,
        timeframe: &str,
        after: NaiveDateTime,
        limit: usize,
    ) -> Result<Vec<Bar>, BracketeerError>;

    /// The last `limit` bars strictly before `before`, ascending.
    fn bars_before(
        &self,
        symbol: &str,
        timeframe: &str,
        before: NaiveDateTime,
        limit: usize,
    ) -> Result<Vec<Bar>, BracketeerError>;

    fn bar_by_id(&self, id: i64) -> Result<Option<Bar>, BracketeerError>;

    /// Whether any bar of the series falls inside `window`.
    fn has_bars_in(
        &self,
        symbol: &str,
        timeframe: &str,
        window: &TimeWindow,
    ) -> Result<bool, BracketeerError>;

    /// First timestamp, last timestamp and bar count of a series.
    fn data_range(
        &self,
        symbol: &str,
        timeframe: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, BracketeerError>;

    /// Insert bars, ignoring timestamps already stored. Returns rows inserted.
    fn insert_bars(&self, bars: &[Bar]) -> Result<usize, BracketeerError>;
}
