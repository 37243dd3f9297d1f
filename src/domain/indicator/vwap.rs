//! Session VWAP: cumulative close * volume over cumulative volume, reset at
//! each calendar day boundary.

use super::Series;
use crate::domain::bar::Bar;
use chrono::NaiveDate;

pub fn session_vwap(bars: &[Bar]) -> Series {
    let mut values = Vec::with_capacity(bars.len());
    let mut session: Option<NaiveDate> = None;
    let mut price_volume = 0.0;
    let mut volume = 0.0;

    for bar in bars {
        let day = bar.timestamp.date();
        if session != Some(day) {
            session = Some(day);
            price_volume = 0.0;
            volume = 0.0;
        }
        price_volume += bar.close * bar.volume;
        volume += bar.volume;

        values.push(if volume > 0.0 {
            Some(price_volume / volume)
        } else {
            None
        });
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::IndicatorSnapshot;

    fn make_bar(day: u32, hour: u32, close: f64, volume: f64) -> Bar {
        Bar {
            id: 0,
            symbol: "NQ".into(),
            timeframe: "1h".into(),
            timestamp: NaiveDate::from_ymd_opt(2024, 2, day)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume,
            indicators: IndicatorSnapshot::default(),
        }
    }

    #[test]
    fn vwap_weights_by_volume() {
        let bars = vec![make_bar(1, 10, 100.0, 1.0), make_bar(1, 11, 110.0, 3.0)];
        let series = session_vwap(&bars);
        assert!((series[0].unwrap() - 100.0).abs() < f64::EPSILON);
        assert!((series[1].unwrap() - 107.5).abs() < f64::EPSILON);
    }

    #[test]
    fn vwap_resets_each_day() {
        let bars = vec![
            make_bar(1, 10, 100.0, 5.0),
            make_bar(2, 10, 200.0, 1.0),
        ];
        let series = session_vwap(&bars);
        assert!((series[1].unwrap() - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn vwap_undefined_without_volume() {
        let bars = vec![make_bar(1, 10, 100.0, 0.0), make_bar(1, 11, 101.0, 2.0)];
        let series = session_vwap(&bars);
        assert!(series[0].is_none());
        assert!((series[1].unwrap() - 101.0).abs() < f64::EPSILON);
    }
}
