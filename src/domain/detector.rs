//! Triple-RSI candidate detection.
//!
//! For every bar index `i >= 2` of one ordered (symbol, timeframe) series:
//!
//! 1. ATR at `i` must lie within `[atr_min, atr_max]`.
//! 2. Long gate: RSI(14) below `rsi14_buy`, RSI(2) crossing up through
//!    `rsi2_buy_cross` (`prev <= level < now`), RSI(5) non-decreasing.
//!    Short gate: RSI(14) above `rsi14_sell`, RSI(2) crossing down through
//!    `rsi2_sell_cross` (`prev >= level > now`), RSI(5) non-increasing.
//! 3. Volume surge: volume above 1.2x its trailing mean over the window.
//! 4. VWAP deviation in ATR units, gated when `vwap_dev_atr > 0`.
//! 5. EMA alignment from EMAs of the configured spans.

use crate::domain::bar::Bar;
use crate::domain::candidate::Setup;
use crate::domain::error::BracketeerError;
use crate::domain::filter_config::FilterConfig;
use crate::domain::indicator::{Series, ema::ema};
use crate::domain::side::Side;
use crate::domain::summary::BatchSummary;
use crate::domain::window::TimeWindow;
use tracing::debug;

/// Bars of history needed before a crossover can be evaluated.
pub const MIN_HISTORY: usize = 2;

const VOLUME_SURGE_FACTOR: f64 = 1.2;

/// EMAs of the configured spans over a scanned series.
struct EmaPair {
    fast: Series,
    slow: Series,
}

impl EmaPair {
    fn new(bars: &[Bar], config: &FilterConfig) -> Self {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        EmaPair {
            fast: ema(&closes, config.ema_fast),
            slow: ema(&closes, config.ema_slow),
        }
    }
}

fn long_gate(config: &FilterConfig, rsi14: f64, rsi5: (f64, f64), rsi2: (f64, f64)) -> bool {
    let level = config.rsi2_buy_cross;
    rsi14 < config.rsi14_buy && rsi2.0 <= level && level < rsi2.1 && rsi5.1 >= rsi5.0
}

fn short_gate(config: &FilterConfig, rsi14: f64, rsi5: (f64, f64), rsi2: (f64, f64)) -> bool {
    let level = config.rsi2_sell_cross;
    rsi14 > config.rsi14_sell && rsi2.0 >= level && level > rsi2.1 && rsi5.1 <= rsi5.0
}

/// Current volume against the mean of the `window` bars before it.
pub fn volume_surge(bars: &[Bar], i: usize, window: usize) -> bool {
    if window == 0 || i < window {
        return false;
    }
    let mean = bars[i - window..i].iter().map(|b| b.volume).sum::<f64>() / window as f64;
    bars[i].volume > mean * VOLUME_SURGE_FACTOR
}

/// |close - vwap| in ATR units; 0 when either is missing or ATR is zero.
pub fn vwap_deviation(close: f64, vwap: Option<f64>, atr: Option<f64>) -> f64 {
    match (vwap, atr) {
        (Some(vwap), Some(atr)) if atr != 0.0 => (close - vwap).abs() / atr,
        _ => 0.0,
    }
}

fn evaluate(
    bars: &[Bar],
    i: usize,
    config: &FilterConfig,
    emas: &EmaPair,
) -> Result<Option<Setup>, BracketeerError> {
    let insufficient = || BracketeerError::InsufficientHistory {
        index: i,
        required: MIN_HISTORY,
    };
    if i < MIN_HISTORY {
        return Err(insufficient());
    }

    let bar = &bars[i];
    let now = &bar.indicators;
    let prev = &bars[i - 1].indicators;

    let atr = now.atr.ok_or_else(insufficient)?;
    if atr < config.atr_min || atr > config.atr_max {
        return Ok(None);
    }

    let (rsi14, rsi5, rsi2) = match (now.rsi14, prev.rsi5, now.rsi5, prev.rsi2, now.rsi2) {
        (Some(r14), Some(r5p), Some(r5n), Some(r2p), Some(r2n)) => (r14, (r5p, r5n), (r2p, r2n)),
        _ => return Err(insufficient()),
    };

    let signal = if long_gate(config, rsi14, rsi5, rsi2) {
        Side::Long
    } else if short_gate(config, rsi14, rsi5, rsi2) {
        Side::Short
    } else {
        return Ok(None);
    };

    let surge = volume_surge(bars, i, config.volume_ma_window);
    let vwap_dev = vwap_deviation(bar.close, now.vwap, now.atr);
    if config.vwap_dev_atr > 0.0 && vwap_dev < config.vwap_dev_atr {
        return Ok(None);
    }

    let (fast, slow) = (emas.fast[i], emas.slow[i]);
    let ema_aligned = match (fast, slow, signal) {
        (Some(f), Some(s), Side::Long) => f >= s,
        (Some(f), Some(s), Side::Short) => f <= s,
        _ => false,
    };

    let mut indicators = *now;
    indicators.ema_fast = fast;
    indicators.ema_slow = slow;

    Ok(Some(Setup {
        symbol: bar.symbol.clone(),
        timeframe: bar.timeframe.clone(),
        timestamp: bar.timestamp,
        bar_id: bar.id,
        signal,
        indicators,
        ema_aligned,
        volume_surge: surge,
        vwap_dev,
    }))
}

/// Scan an ordered series and hand every setup to `emit` as soon as it is
/// found.
///
/// Only bars whose timestamp falls inside `window` may fire; earlier bars
/// still provide crossover and moving-average context. `emit` returns
/// `false` for a setup that already exists, which is counted as skipped.
pub fn scan<F>(
    bars: &[Bar],
    config: &FilterConfig,
    window: Option<&TimeWindow>,
    mut emit: F,
) -> Result<BatchSummary, BracketeerError>
where
    F: FnMut(Setup) -> Result<bool, BracketeerError>,
{
    let emas = EmaPair::new(bars, config);
    let mut summary = BatchSummary::default();

    for i in MIN_HISTORY..bars.len() {
        if window.is_some_and(|w| !w.contains(bars[i].timestamp)) {
            continue;
        }
        match evaluate(bars, i, config, &emas) {
            Ok(Some(setup)) => {
                let timestamp = setup.timestamp;
                if emit(setup)? {
                    summary.processed += 1;
                } else {
                    debug!(index = i, %timestamp, "duplicate candidate ignored");
                    summary.skipped += 1;
                }
            }
            Ok(None) => {}
            Err(e) if e.is_per_record() => {
                debug!(index = i, error = %e, "bar skipped");
                summary.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(summary)
}
