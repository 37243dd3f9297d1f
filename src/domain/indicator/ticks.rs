//! Tick distance ↔ price conversion.

use crate::domain::side::Side;

/// Price `ticks` ticks away from `entry` in the direction of `side`.
pub fn ticks_to_price(entry: f64, ticks: u32, tick_size: f64, side: Side) -> f64 {
    entry + side.sign() * ticks as f64 * tick_size
}

/// Signed tick distance from `entry` to `price`, positive in favour of `side`.
pub fn price_to_ticks(entry: f64, price: f64, tick_size: f64, side: Side) -> f64 {
    side.sign() * (price - entry) / tick_size
}

/// Whole ticks of realized P&L for a position on `side`.
pub fn realized_ticks(entry: f64, exit: f64, tick_size: f64, side: Side) -> i64 {
    price_to_ticks(entry, exit, tick_size, side).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn long_target_is_above_entry() {
        assert!((ticks_to_price(100.0, 16, 0.25, Side::Long) - 104.0).abs() < 1e-12);
        assert!((ticks_to_price(100.0, 8, 0.25, Side::Short) - 98.0).abs() < 1e-12);
    }

    #[test]
    fn realized_ticks_flip_for_shorts() {
        assert_eq!(realized_ticks(100.0, 98.0, 0.25, Side::Short), 8);
        assert_eq!(realized_ticks(100.0, 98.0, 0.25, Side::Long), -8);
    }

    #[test]
    fn realized_ticks_round_to_nearest() {
        assert_eq!(realized_ticks(100.0, 100.37, 0.25, Side::Long), 1);
        assert_eq!(realized_ticks(100.0, 100.38, 0.25, Side::Long), 2);
    }

    proptest! {
        #[test]
        fn tick_round_trip(
            entry in 1.0f64..50_000.0,
            ticks in 0u32..5_000,
            tick_size in prop::sample::select(vec![0.01, 0.1, 0.25, 1.0, 5.0]),
            long in any::<bool>(),
        ) {
            let side = if long { Side::Long } else { Side::Short };
            let price = ticks_to_price(entry, ticks, tick_size, side);
            let back = price_to_ticks(entry, price, tick_size, side);
            prop_assert!((back - ticks as f64).abs() < 1e-6);
        }
    }
}
