//! Exponential Moving Average.
//!
//! k = 2/(n+1), seed with first SMA, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Warmup: first (n-1) bars are `None`.

use super::Series;

pub fn ema(closes: &[f64], span: usize) -> Series {
    if span == 0 {
        return vec![None; closes.len()];
    }

    let mut values = Vec::with_capacity(closes.len());
    let k = 2.0 / (span as f64 + 1.0);
    let mut current = 0.0;
    let mut sum = 0.0;

    for (i, &close) in closes.iter().enumerate() {
        if i < span - 1 {
            sum += close;
            values.push(None);
        } else if i == span - 1 {
            sum += close;
            current = sum / span as f64;
            values.push(Some(current));
        } else {
            current = close * k + current * (1.0 - k);
            values.push(Some(current));
        }
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_warmup() {
        let series = ema(&[10.0, 20.0, 30.0, 40.0, 50.0], 3);
        assert!(series[0].is_none());
        assert!(series[1].is_none());
        assert!(series[2..].iter().all(Option::is_some));
    }

    #[test]
    fn ema_span_1_tracks_close() {
        let series = ema(&[10.0, 20.0, 30.0], 1);
        assert_eq!(series, vec![Some(10.0), Some(20.0), Some(30.0)]);
    }

    #[test]
    fn ema_recursive_calculation() {
        let series = ema(&[10.0, 20.0, 30.0, 40.0, 50.0], 3);
        let k = 2.0 / 4.0;
        let sma = 20.0;
        let ema_3 = 40.0 * k + sma * (1.0 - k);
        let ema_4 = 50.0 * k + ema_3 * (1.0 - k);

        assert!((series[2].unwrap() - sma).abs() < f64::EPSILON);
        assert!((series[3].unwrap() - ema_3).abs() < f64::EPSILON);
        assert!((series[4].unwrap() - ema_4).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_span_0() {
        assert_eq!(ema(&[10.0, 20.0], 0), vec![None, None]);
    }

    #[test]
    fn ema_shorter_than_span() {
        assert_eq!(ema(&[10.0, 20.0], 5), vec![None, None]);
    }
}
