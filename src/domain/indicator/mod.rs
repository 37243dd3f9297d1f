//! Technical indicator library.
//!
//! Every function is pure and returns one value per input bar. Bars inside an
//! indicator's warmup window carry `None`.
//!
//! - [`rsi`]: Relative Strength Index with Wilder smoothing
//! - [`ema`]: Exponential Moving Average seeded with an SMA
//! - [`atr`]: Average True Range with Wilder smoothing
//! - [`vwap`]: session VWAP, reset each calendar day
//! - [`ticks`]: tick distance to price conversion

pub mod atr;
pub mod ema;
pub mod rsi;
pub mod ticks;
pub mod vwap;

use crate::domain::bar::Bar;

/// One optional value per bar.
pub type Series = Vec<Option<f64>>;

pub const ATR_PERIOD: usize = 14;
pub const RSI_SLOW: usize = 14;
pub const RSI_MID: usize = 5;
pub const RSI_FAST: usize = 2;

/// Fill the precomputed indicator snapshot of every bar in an ordered series.
pub fn enrich(bars: &mut [Bar], ema_fast: usize, ema_slow: usize) {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let atr = atr::atr(bars, ATR_PERIOD);
    let rsi14 = rsi::rsi(&closes, RSI_SLOW);
    let rsi5 = rsi::rsi(&closes, RSI_MID);
    let rsi2 = rsi::rsi(&closes, RSI_FAST);
    let fast = ema::ema(&closes, ema_fast);
    let slow = ema::ema(&closes, ema_slow);
    let vwap = vwap::session_vwap(bars);

    for (i, bar) in bars.iter_mut().enumerate() {
        let snapshot = &mut bar.indicators;
        snapshot.atr = atr[i];
        snapshot.rsi14 = rsi14[i];
        snapshot.rsi5 = rsi5[i];
        snapshot.rsi2 = rsi2[i];
        snapshot.ema_fast = fast[i];
        snapshot.ema_slow = slow[i];
        snapshot.vwap = vwap[i];
    }
}

/// Enrich `bars` as the continuation of `history`, the stored bars that
/// precede them. Only `bars` is returned.
pub fn enrich_after(history: &[Bar], bars: Vec<Bar>, ema_fast: usize, ema_slow: usize) -> Vec<Bar> {
    if history.is_empty() {
        let mut bars = bars;
        enrich(&mut bars, ema_fast, ema_slow);
        return bars;
    }
    let mut joined = history.to_vec();
    joined.extend(bars);
    enrich(&mut joined, ema_fast, ema_slow);
    joined.split_off(history.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::IndicatorSnapshot;
    use chrono::NaiveDate;

    fn make_bars(closes: &[f64]) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                id: 0,
                symbol: "ES".into(),
                timeframe: "5m".into(),
                timestamp: start + chrono::Duration::minutes(5 * i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 100.0,
                indicators: IndicatorSnapshot::default(),
            })
            .collect()
    }

    #[test]
    fn enrich_fills_every_field_after_warmup() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i % 7) as f64).collect();
        let mut bars = make_bars(&closes);
        enrich(&mut bars, 9, 21);

        let last = bars.last().unwrap().indicators;
        assert!(last.atr.is_some());
        assert!(last.rsi14.is_some());
        assert!(last.rsi5.is_some());
        assert!(last.rsi2.is_some());
        assert!(last.ema_fast.is_some());
        assert!(last.ema_slow.is_some());
        assert!(last.vwap.is_some());
    }

    #[test]
    fn enrich_leaves_warmup_empty() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let mut bars = make_bars(&closes);
        enrich(&mut bars, 9, 21);

        assert!(bars[0].indicators.rsi2.is_none());
        assert!(bars[2].indicators.rsi2.is_some());
        assert!(bars[19].indicators.ema_slow.is_none());
        assert!(bars[20].indicators.ema_slow.is_some());
        assert!(bars[0].indicators.vwap.is_some());
    }

    #[test]
    fn enrich_after_continues_the_stored_series() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + ((i * 7) % 11) as f64).collect();
        let mut whole = make_bars(&closes);
        enrich(&mut whole, 9, 21);

        let mut head = make_bars(&closes[..35]);
        enrich(&mut head, 9, 21);
        let tail = make_bars(&closes[35..]);
        let continued = enrich_after(&head, tail, 9, 21);

        assert_eq!(continued.len(), 25);
        for (bar, expected) in continued.iter().zip(&whole[35..]) {
            assert_eq!(bar.timestamp, expected.timestamp);
            assert_eq!(bar.indicators, expected.indicators);
        }
        assert!(continued[0].indicators.rsi14.is_some());
        assert!(continued[0].indicators.atr.is_some());
    }

    #[test]
    fn enrich_after_without_history_is_enrich() {
        let closes: Vec<f64> = (0..20).map(|i| 50.0 + i as f64).collect();
        let mut expected = make_bars(&closes);
        enrich(&mut expected, 3, 6);
        assert_eq!(enrich_after(&[], make_bars(&closes), 3, 6), expected);
    }
}
