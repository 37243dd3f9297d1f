//! Average True Range with Wilder smoothing.
//!
//! The first bar's true range is high - low. The seed is the mean of the
//! first n true ranges; after that ATR[i] = (ATR[i-1] * (n-1) + TR[i]) / n.

use super::Series;
use crate::domain::bar::Bar;

pub fn atr(bars: &[Bar], period: usize) -> Series {
    if period == 0 || bars.len() < period {
        return vec![None; bars.len()];
    }

    let true_ranges: Vec<f64> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect();

    let mut values: Series = Vec::with_capacity(bars.len());
    let mut current = 0.0;

    for (i, tr) in true_ranges.iter().enumerate() {
        if i + 1 < period {
            values.push(None);
        } else if i + 1 == period {
            current = true_ranges[..period].iter().sum::<f64>() / period as f64;
            values.push(Some(current));
        } else {
            current = (current * (period - 1) as f64 + tr) / period as f64;
            values.push(Some(current));
        }
    }

    values
}
