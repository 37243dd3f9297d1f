//! Price bar with its precomputed indicator snapshot.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Storage and display format for bar, candidate and trade timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Indicator values computed once at ingestion.
///
/// Every field is optional: warmup bars have no value for long lookbacks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub atr: Option<f64>,
    pub rsi14: Option<f64>,
    pub rsi5: Option<f64>,
    pub rsi2: Option<f64>,
    pub ema_fast: Option<f64>,
    pub ema_slow: Option<f64>,
    pub vwap: Option<f64>,
}

/// One bar of a (symbol, timeframe) series.
///
/// `id` is assigned by the candle store and is 0 until persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub id: i64,
    pub symbol: String,
    pub timeframe: String,
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub indicators: IndicatorSnapshot,
}

impl Bar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// Returns true when timestamps are strictly increasing (no duplicates).
pub fn is_strictly_ordered(bars: &[Bar]) -> bool {
    bars.windows(2).all(|w| w[0].timestamp < w[1].timestamp)
}
