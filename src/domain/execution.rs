//! Turning a directed candidate into a trade record.
//!
//! The bar walk itself lives in [`crate::domain::simulator`]; this module
//! supplies the per-symbol tick sizes and execution settings and assembles
//! the resulting [`NewTrade`].

use std::collections::HashMap;

use crate::domain::bar::Bar;
use crate::domain::candidate::Candidate;
use crate::domain::error::BracketeerError;
use crate::domain::filter_config::FilterConfig;
use crate::domain::side::Side;
use crate::domain::simulator::{Bracket, BracketParams, simulate};
use crate::domain::trade::NewTrade;

pub const DEFAULT_TICK_SIZE: f64 = 0.25;

/// Minimum price increment per symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct TickSizes {
    sizes: HashMap<String, f64>,
    fallback: f64,
}

impl TickSizes {
    pub fn new(fallback: f64) -> Self {
        TickSizes {
            sizes: HashMap::new(),
            fallback,
        }
    }

    pub fn with(mut self, symbol: &str, size: f64) -> Self {
        self.sizes.insert(symbol.to_uppercase(), size);
        self
    }

    pub fn get(&self, symbol: &str) -> f64 {
        self.sizes
            .get(&symbol.to_uppercase())
            .copied()
            .unwrap_or(self.fallback)
    }
}

impl Default for TickSizes {
    fn default() -> Self {
        TickSizes::new(DEFAULT_TICK_SIZE)
            .with("ES", 0.25)
            .with("NQ", 0.25)
            .with("YM", 1.0)
    }
}

/// Settings shared by every trade of an execution pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionSettings {
    pub bracket: BracketParams,
    /// Minimum decision score, inclusive.
    pub score_threshold: f64,
    pub tick_sizes: TickSizes,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        ExecutionSettings {
            bracket: BracketParams::default(),
            score_threshold: 7.0,
            tick_sizes: TickSizes::default(),
        }
    }
}

/// Simulate `candidate` on `side` over `bars`, the bars strictly after the
/// candidate's timestamp.
///
/// Fails with [`BracketeerError::DataGap`] when there is no entry bar or the
/// walk cannot finish on the bars available.
pub fn build_trade(
    candidate: &Candidate,
    side: Side,
    score: f64,
    bars: &[Bar],
    settings: &ExecutionSettings,
    filter_config: &FilterConfig,
) -> Result<NewTrade, BracketeerError> {
    let gap = || BracketeerError::DataGap {
        candidate_id: candidate.id,
    };
    let entry_bar = bars.first().ok_or_else(gap)?;

    let tick_size = settings.tick_sizes.get(&candidate.setup.symbol);
    let bracket = Bracket::new(entry_bar.open, side, tick_size, &settings.bracket);
    let exit = simulate(&bracket, bars, &settings.bracket).ok_or_else(gap)?;

    Ok(NewTrade {
        candidate_id: candidate.id,
        symbol: candidate.setup.symbol.clone(),
        timeframe: candidate.setup.timeframe.clone(),
        side,
        entry_time: entry_bar.timestamp,
        entry_price: bracket.entry,
        exit_time: bars[exit.offset].timestamp,
        exit_price: exit.price,
        exit_reason: exit.reason,
        stop_price: bracket.stop,
        target_price: bracket.target,
        position_size: 1,
        pnl: exit.pnl_ticks as f64 * tick_size,
        pnl_ticks: exit.pnl_ticks,
        mfe: exit.excursion.mfe,
        mae: exit.excursion.mae,
        bars_held: exit.bars_held,
        filter_config: filter_config.clone(),
        score,
    })
}
