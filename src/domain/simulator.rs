//! Bracket-order execution simulation.
//!
//! A position is entered at the open of the first bar after a candidate and
//! walked forward bar by bar until the target or the stop is touched, or until
//! the holding cap expires. When a single bar straddles both levels the
//! configured [`TieBreak`] decides which one filled first.

use crate::domain::bar::Bar;
use crate::domain::indicator::ticks::{realized_ticks, ticks_to_price};
use crate::domain::side::Side;
use crate::domain::trade::ExitReason;
use std::fmt;
use std::str::FromStr;

/// Resolution of a bar whose range touches both stop and target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// Assume the adverse level filled first.
    #[default]
    StopFirst,
    TargetFirst,
}

impl fmt::Display for TieBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TieBreak::StopFirst => f.write_str("stop_first"),
            TieBreak::TargetFirst => f.write_str("target_first"),
        }
    }
}

impl FromStr for TieBreak {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stop_first" => Ok(TieBreak::StopFirst),
            "target_first" => Ok(TieBreak::TargetFirst),
            other => Err(format!("unknown tie break '{}'", other)),
        }
    }
}

/// Execution parameters shared by every trade in a run.
#[derive(Debug, Clone, PartialEq)]
pub struct BracketParams {
    pub stop_ticks: u32,
    pub target_ticks: u32,
    pub max_hold_bars: usize,
    pub tie_break: TieBreak,
}

impl Default for BracketParams {
    fn default() -> Self {
        BracketParams {
            stop_ticks: 8,
            target_ticks: 16,
            max_hold_bars: 60,
            tie_break: TieBreak::StopFirst,
        }
    }
}

/// Stop and target levels around an entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub side: Side,
    pub entry: f64,
    pub stop: f64,
    pub target: f64,
    pub tick_size: f64,
}

impl Bracket {
    pub fn new(entry: f64, side: Side, tick_size: f64, params: &BracketParams) -> Self {
        Bracket {
            side,
            entry,
            stop: ticks_to_price(entry, params.stop_ticks, tick_size, side.opposite()),
            target: ticks_to_price(entry, params.target_ticks, tick_size, side),
            tick_size,
        }
    }

    /// (target touched, stop touched) within the bar's range.
    fn touches(&self, bar: &Bar) -> (bool, bool) {
        match self.side {
            Side::Long => (bar.high >= self.target, bar.low <= self.stop),
            Side::Short => (bar.low <= self.target, bar.high >= self.stop),
        }
    }

    /// (favorable, adverse) distance reached within the bar, both >= 0.
    fn excursions(&self, bar: &Bar) -> (f64, f64) {
        match self.side {
            Side::Long => ((bar.high - self.entry).max(0.0), (self.entry - bar.low).max(0.0)),
            Side::Short => ((self.entry - bar.low).max(0.0), (bar.high - self.entry).max(0.0)),
        }
    }

    pub fn realized_ticks(&self, exit: f64) -> i64 {
        realized_ticks(self.entry, exit, self.tick_size, self.side)
    }
}

/// Running maximum favorable/adverse excursion, in price units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Excursion {
    pub mfe: f64,
    pub mae: f64,
}

/// State after one bar of the walk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkStep {
    /// Offset from the entry bar.
    pub offset: usize,
    pub excursion: Excursion,
    pub exit: Option<(ExitReason, f64)>,
}

/// Iterator over the bars of a bracket walk, ending at the exit bar or at the
/// holding cap, whichever comes first.
pub struct BracketWalk<'a> {
    bracket: Bracket,
    bars: &'a [Bar],
    cap: usize,
    tie_break: TieBreak,
    offset: usize,
    excursion: Excursion,
    finished: bool,
}

impl<'a> BracketWalk<'a> {
    /// `bars` must start at the entry bar.
    pub fn new(bracket: Bracket, bars: &'a [Bar], params: &BracketParams) -> Self {
        BracketWalk {
            bracket,
            bars,
            cap: params.max_hold_bars.max(1),
            tie_break: params.tie_break,
            offset: 0,
            excursion: Excursion::default(),
            finished: false,
        }
    }
}

impl Iterator for BracketWalk<'_> {
    type Item = WalkStep;

    fn next(&mut self) -> Option<WalkStep> {
        if self.finished || self.offset >= self.cap {
            return None;
        }
        let bar = self.bars.get(self.offset)?;

        let (favorable, adverse) = self.bracket.excursions(bar);
        self.excursion.mfe = self.excursion.mfe.max(favorable);
        self.excursion.mae = self.excursion.mae.max(adverse);

        let exit = match (self.bracket.touches(bar), self.tie_break) {
            ((true, true), TieBreak::StopFirst) => Some((ExitReason::Stop, self.bracket.stop)),
            ((true, true), TieBreak::TargetFirst) => {
                Some((ExitReason::Target, self.bracket.target))
            }
            ((true, false), _) => Some((ExitReason::Target, self.bracket.target)),
            ((false, true), _) => Some((ExitReason::Stop, self.bracket.stop)),
            ((false, false), _) => None,
        };

        let step = WalkStep {
            offset: self.offset,
            excursion: self.excursion,
            exit,
        };
        self.finished = exit.is_some();
        self.offset += 1;
        Some(step)
    }
}

/// Outcome of a completed walk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedExit {
    /// Offset of the exit bar from the entry bar.
    pub offset: usize,
    pub price: f64,
    pub reason: ExitReason,
    pub excursion: Excursion,
    pub bars_held: usize,
    pub pnl_ticks: i64,
}

/// Walk `bars` (starting at the entry bar) under `bracket`.
///
/// Returns `None` when history ends before either level is touched and before
/// the holding cap is complete; the caller defers such a trade.
pub fn simulate(bracket: &Bracket, bars: &[Bar], params: &BracketParams) -> Option<SimulatedExit> {
    let cap = params.max_hold_bars.max(1);
    let mut last: Option<WalkStep> = None;

    for step in BracketWalk::new(*bracket, bars, params) {
        if let Some((reason, price)) = step.exit {
            return Some(SimulatedExit {
                offset: step.offset,
                price,
                reason,
                excursion: step.excursion,
                bars_held: step.offset + 1,
                pnl_ticks: bracket.realized_ticks(price),
            });
        }
        last = Some(step);
    }

    let last = last?;
    if last.offset + 1 < cap {
        return None;
    }
    let price = bars[last.offset].close;
    Some(SimulatedExit {
        offset: last.offset,
        price,
        reason: ExitReason::TimeCap,
        excursion: last.excursion,
        bars_held: last.offset + 1,
        pnl_ticks: bracket.realized_ticks(price),
    })
}
