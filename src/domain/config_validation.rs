//! Configuration loading and validation.
//!
//! Reads each INI section into its typed settings and rejects out-of-range
//! values before any command runs.

use crate::domain::error::BracketeerError;
use crate::domain::execution::{DEFAULT_TICK_SIZE, ExecutionSettings, TickSizes};
use crate::domain::filter_config::FilterConfig;
use crate::domain::scope::Scope;
use crate::domain::simulator::{BracketParams, TieBreak};
use crate::domain::walk_forward::OptimizerSettings;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_SYMBOLS: [&str; 3] = ["ES", "NQ", "YM"];
pub const DEFAULT_TIMEFRAMES: [&str; 3] = ["1m", "5m", "15m"];

pub const MAX_TICKS: i64 = 100_000;
pub const MAX_HOLD_BARS: i64 = 100_000;
/// Upper bound on a train or test window, in days.
pub const MAX_WINDOW_DAYS: i64 = 3_650;
pub const MAX_POOL_SIZE: i64 = 64;
pub const MAX_INDICATOR_SPAN: i64 = 1_000;

/// Validate every section a command may read.
pub fn validate_all(config: &dyn ConfigPort) -> Result<(), BracketeerError> {
    validate_sqlite(config)?;
    universe(config)?;
    execution_settings(config)?;
    seed_filter_config(config)?;
    optimizer_settings(config)?;
    validate_scorer(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> BracketeerError {
    BracketeerError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn positive_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
    max: i64,
) -> Result<i64, BracketeerError> {
    check_range(section, key, config.get_int(section, key, default), 1, max)
}

/// `value` within `[min, max]`, or `ConfigInvalid` naming the key.
pub fn check_range(section: &str, key: &str, value: i64, min: i64, max: i64) -> Result<i64, BracketeerError> {
    if value < min || value > max {
        return Err(invalid(
            section,
            key,
            format!("{} must be within [{}, {}], got {}", key, min, max, value),
        ));
    }
    Ok(value)
}

fn validate_sqlite(config: &dyn ConfigPort) -> Result<(), BracketeerError> {
    match config.get_string("sqlite", "path") {
        Some(s) if !s.trim().is_empty() => {}
        _ => {
            return Err(BracketeerError::ConfigMissing {
                section: "sqlite".to_string(),
                key: "path".to_string(),
            });
        }
    }
    positive_int(config, "sqlite", "pool_size", 4, MAX_POOL_SIZE)?;
    Ok(())
}

/// `[universe]` symbols and timeframes.
pub fn universe(config: &dyn ConfigPort) -> Result<Scope, BracketeerError> {
    let symbols = config.get_list("universe", "symbols", &DEFAULT_SYMBOLS);
    let timeframes = config.get_list("universe", "timeframes", &DEFAULT_TIMEFRAMES);
    Ok(Scope::new(symbols, timeframes))
}

/// `[tick_sizes]` for the given symbols, over the built-in defaults.
pub fn tick_sizes(config: &dyn ConfigPort, symbols: &[String]) -> Result<TickSizes, BracketeerError> {
    let defaults = TickSizes::default();
    let mut sizes = TickSizes::new(DEFAULT_TICK_SIZE);
    for symbol in symbols {
        let size = config.get_double("tick_sizes", symbol, defaults.get(symbol));
        if !(size > 0.0) {
            return Err(invalid("tick_sizes", symbol, "tick size must be positive"));
        }
        sizes = sizes.with(symbol, size);
    }
    for (symbol, size) in [("ES", 0.25), ("NQ", 0.25), ("YM", 1.0)] {
        if !symbols.iter().any(|s| s.eq_ignore_ascii_case(symbol)) {
            sizes = sizes.with(symbol, size);
        }
    }
    Ok(sizes)
}

/// `[execution]` plus the tick sizes of the configured universe.
pub fn execution_settings(config: &dyn ConfigPort) -> Result<ExecutionSettings, BracketeerError> {
    let stop_ticks = positive_int(config, "execution", "stop_loss_ticks", 8, MAX_TICKS)?;
    let target_ticks = positive_int(config, "execution", "take_profit_ticks", 16, MAX_TICKS)?;
    let max_hold_bars = positive_int(config, "execution", "max_hold_bars", 60, MAX_HOLD_BARS)?;

    let score_threshold = config.get_double("execution", "score_threshold", 7.0);
    if !score_threshold.is_finite() {
        return Err(invalid("execution", "score_threshold", "score_threshold must be a number"));
    }

    let tie_break = match config.get_string("execution", "tie_break") {
        Some(raw) => raw
            .parse::<TieBreak>()
            .map_err(|reason| invalid("execution", "tie_break", reason))?,
        None => TieBreak::default(),
    };

    let scope = universe(config)?;
    Ok(ExecutionSettings {
        bracket: BracketParams {
            stop_ticks: stop_ticks as u32,
            target_ticks: target_ticks as u32,
            max_hold_bars: max_hold_bars as usize,
            tie_break,
        },
        score_threshold,
        tick_sizes: tick_sizes(config, &scope.symbols)?,
    })
}

/// `[filters]`: the configuration used until one has been promoted.
pub fn seed_filter_config(config: &dyn ConfigPort) -> Result<FilterConfig, BracketeerError> {
    let d = FilterConfig::default();
    let window = check_range(
        "filters",
        "volume_ma_window",
        config.get_int("filters", "volume_ma_window", d.volume_ma_window as i64),
        0,
        MAX_INDICATOR_SPAN,
    )?;

    let seed = FilterConfig {
        atr_min: config.get_double("filters", "atr_min", d.atr_min),
        atr_max: config.get_double("filters", "atr_max", d.atr_max),
        rsi14_buy: config.get_double("filters", "rsi14_buy", d.rsi14_buy),
        rsi14_sell: config.get_double("filters", "rsi14_sell", d.rsi14_sell),
        rsi2_buy_cross: config.get_double("filters", "rsi2_buy_cross", d.rsi2_buy_cross),
        rsi2_sell_cross: config.get_double("filters", "rsi2_sell_cross", d.rsi2_sell_cross),
        volume_ma_window: window as usize,
        ema_fast: positive_int(config, "filters", "ema_fast", d.ema_fast as i64, MAX_INDICATOR_SPAN)? as usize,
        ema_slow: positive_int(config, "filters", "ema_slow", d.ema_slow as i64, MAX_INDICATOR_SPAN)? as usize,
        vwap_dev_atr: config.get_double("filters", "vwap_dev_atr", d.vwap_dev_atr),
    };
    seed.validate()?;
    Ok(seed)
}

/// `[optimizer]`
pub fn optimizer_settings(config: &dyn ConfigPort) -> Result<OptimizerSettings, BracketeerError> {
    let d = OptimizerSettings::default();
    let settings = OptimizerSettings {
        train_days: positive_int(config, "optimizer", "train_days", d.train_days, MAX_WINDOW_DAYS)?,
        test_days: positive_int(config, "optimizer", "test_days", d.test_days, MAX_WINDOW_DAYS)?,
        min_trades: config.get_int("optimizer", "min_trades", d.min_trades as i64).max(0) as usize,
        min_eligible_trades: config
            .get_int("optimizer", "min_eligible_trades", d.min_eligible_trades as i64)
            .max(0) as usize,
        eligible_fraction: config.get_double("optimizer", "eligible_fraction", d.eligible_fraction),
        win_rate_margin: config.get_double("optimizer", "win_rate_margin", d.win_rate_margin),
        isolated: config.get_bool("optimizer", "isolated", d.isolated),
    };

    if !(0.0..=1.0).contains(&settings.eligible_fraction) {
        return Err(invalid("optimizer", "eligible_fraction", "eligible_fraction must be within [0, 1]"));
    }
    if !(0.0..1.0).contains(&settings.win_rate_margin) {
        return Err(invalid("optimizer", "win_rate_margin", "win_rate_margin must be within [0, 1)"));
    }
    Ok(settings)
}

fn validate_scorer(config: &dyn ConfigPort) -> Result<(), BracketeerError> {
    let kind = config.get_string("scorer", "kind").unwrap_or_else(|| "rule".into());
    match kind.trim() {
        "rule" => Ok(()),
        "command" => match config.get_string("scorer", "command") {
            Some(c) if !c.trim().is_empty() => Ok(()),
            _ => Err(BracketeerError::ConfigMissing {
                section: "scorer".to_string(),
                key: "command".to_string(),
            }),
        },
        other => Err(invalid("scorer", "kind", format!("unknown scorer kind '{}'", other))),
    }
}
