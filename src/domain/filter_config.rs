//! Candidate filter parameters and their search neighbourhood.

use crate::domain::error::BracketeerError;
use serde::{Deserialize, Serialize};

/// Thresholds and windows used by the candidate detector.
///
/// A value object: a changed configuration is a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub atr_min: f64,
    pub atr_max: f64,
    pub rsi14_buy: f64,
    pub rsi14_sell: f64,
    pub rsi2_buy_cross: f64,
    pub rsi2_sell_cross: f64,
    pub volume_ma_window: usize,
    pub ema_fast: usize,
    pub ema_slow: usize,
    /// Minimum |close - vwap| in ATR units; 0 disables the gate.
    pub vwap_dev_atr: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            atr_min: 1.0,
            atr_max: 15.0,
            rsi14_buy: 30.0,
            rsi14_sell: 70.0,
            rsi2_buy_cross: 10.0,
            rsi2_sell_cross: 90.0,
            volume_ma_window: 20,
            ema_fast: 9,
            ema_slow: 21,
            vwap_dev_atr: 0.0,
        }
    }
}

const ATR_STEPS: [f64; 3] = [-0.5, 0.0, 0.5];
const RSI14_STEPS: [f64; 3] = [-5.0, 0.0, 5.0];
const EMA_FAST_STEPS: [i64; 3] = [-2, 0, 2];
const EMA_SLOW_STEPS: [i64; 3] = [-4, 0, 4];

const ATR_MIN_FLOOR: f64 = 0.5;
const RSI14_BUY_RANGE: (f64, f64) = (5.0, 50.0);
const RSI14_SELL_RANGE: (f64, f64) = (50.0, 95.0);
const EMA_FAST_FLOOR: i64 = 3;
const EMA_SLOW_FLOOR: i64 = 6;

impl FilterConfig {
    /// Reject user-supplied values outside the bounds the search respects.
    pub fn validate(&self) -> Result<(), BracketeerError> {
        let invalid = |key: &str, reason: &str| BracketeerError::ConfigInvalid {
            section: "filters".into(),
            key: key.into(),
            reason: reason.into(),
        };

        if !(self.atr_min >= 0.0) {
            return Err(invalid("atr_min", "atr_min must be non-negative"));
        }
        if !(self.atr_max > self.atr_min) {
            return Err(invalid("atr_max", "atr_max must be greater than atr_min"));
        }
        if !(RSI14_BUY_RANGE.0..=RSI14_BUY_RANGE.1).contains(&self.rsi14_buy) {
            return Err(invalid("rsi14_buy", "rsi14_buy must be within [5, 50]"));
        }
        if !(RSI14_SELL_RANGE.0..=RSI14_SELL_RANGE.1).contains(&self.rsi14_sell) {
            return Err(invalid("rsi14_sell", "rsi14_sell must be within [50, 95]"));
        }
        if !(0.0..=100.0).contains(&self.rsi2_buy_cross) {
            return Err(invalid("rsi2_buy_cross", "rsi2_buy_cross must be within [0, 100]"));
        }
        if !(0.0..=100.0).contains(&self.rsi2_sell_cross) {
            return Err(invalid("rsi2_sell_cross", "rsi2_sell_cross must be within [0, 100]"));
        }
        if self.ema_fast == 0 || self.ema_slow == 0 {
            return Err(invalid("ema_fast", "EMA spans must be positive"));
        }
        if !(self.vwap_dev_atr >= 0.0) {
            return Err(invalid("vwap_dev_atr", "vwap_dev_atr must be non-negative"));
        }
        Ok(())
    }

    /// Cartesian product of small perturbations around `self`, clamped into
    /// bounds, followed by `self` as the last entry.
    pub fn neighbours(&self) -> Vec<FilterConfig> {
        let mut configs = Vec::new();

        for da in ATR_STEPS {
            for db in RSI14_STEPS {
                for ds in RSI14_STEPS {
                    for ef in EMA_FAST_STEPS {
                        for es in EMA_SLOW_STEPS {
                            configs.push(self.perturbed(da, db, ds, ef, es));
                        }
                    }
                }
            }
        }

        configs.push(self.clone());
        configs
    }

    fn perturbed(&self, atr: f64, buy: f64, sell: f64, fast: i64, slow: i64) -> FilterConfig {
        FilterConfig {
            atr_min: (self.atr_min + atr).max(ATR_MIN_FLOOR),
            atr_max: (self.atr_max + atr).max(self.atr_min + 1.0),
            rsi14_buy: (self.rsi14_buy + buy).clamp(RSI14_BUY_RANGE.0, RSI14_BUY_RANGE.1),
            rsi14_sell: (self.rsi14_sell + sell).clamp(RSI14_SELL_RANGE.0, RSI14_SELL_RANGE.1),
            ema_fast: (self.ema_fast as i64 + fast).max(EMA_FAST_FLOOR) as usize,
            ema_slow: (self.ema_slow as i64 + slow).max(EMA_SLOW_FLOOR) as usize,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        FilterConfig::default().validate().unwrap();
    }

    #[test]
    fn validate_rejects_inverted_atr_band() {
        let config = FilterConfig {
            atr_max: 0.5,
            ..FilterConfig::default()
        };
        match config.validate() {
            Err(BracketeerError::ConfigInvalid { key, .. }) => assert_eq!(key, "atr_max"),
            other => panic!("expected ConfigInvalid, got {:?}", other),
        }
    }

    #[test]
    fn validate_rejects_buy_threshold_out_of_range() {
        let config = FilterConfig {
            rsi14_buy: 60.0,
            ..FilterConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn neighbourhood_size_and_baseline_last() {
        let base = FilterConfig::default();
        let configs = base.neighbours();
        assert_eq!(configs.len(), 3 * 3 * 3 * 3 * 3 + 1);
        assert_eq!(configs.last(), Some(&base));
    }

    #[test]
    fn neighbourhood_clamps_at_bounds() {
        let base = FilterConfig {
            atr_min: 0.6,
            rsi14_buy: 7.0,
            rsi14_sell: 93.0,
            ema_fast: 4,
            ema_slow: 8,
            ..FilterConfig::default()
        };
        for config in base.neighbours() {
            assert!(config.atr_min >= 0.5);
            assert!((5.0..=50.0).contains(&config.rsi14_buy));
            assert!((50.0..=95.0).contains(&config.rsi14_sell));
            assert!(config.ema_fast >= 3);
            assert!(config.ema_slow >= 6);
            config.validate().unwrap();
        }
    }

    #[test]
    fn neighbourhood_keeps_untouched_fields() {
        let base = FilterConfig {
            vwap_dev_atr: 1.5,
            volume_ma_window: 30,
            ..FilterConfig::default()
        };
        for config in base.neighbours() {
            assert_eq!(config.volume_ma_window, 30);
            assert!((config.vwap_dev_atr - 1.5).abs() < f64::EPSILON);
            assert!((config.rsi2_buy_cross - base.rsi2_buy_cross).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn json_snapshot_round_trips() {
        let config = FilterConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: FilterConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
