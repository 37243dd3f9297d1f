#![allow(dead_code)]

use bracketeer::adapters::sqlite_adapter::SqliteAdapter;
use bracketeer::domain::bar::{Bar, IndicatorSnapshot};
use bracketeer::domain::candidate::{Candidate, Decision};
use bracketeer::domain::error::BracketeerError;
use bracketeer::domain::execution::ExecutionSettings;
use bracketeer::domain::scope::Scope;
use bracketeer::domain::side::Direction;
use bracketeer::domain::simulator::BracketParams;
use bracketeer::ports::candle_port::CandlePort;
use bracketeer::ports::decision_port::DecisionPort;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::cell::Cell;

pub const SYMBOL: &str = "ES";
pub const TIMEFRAME: &str = "1h";

/// Bars per setup cycle.
pub const CYCLE: usize = 10;
/// Offset of the signal bar inside a cycle.
pub const SIGNAL_AT: usize = 2;

/// RSI(14) on winning and losing long setups. A `rsi14_buy` of 25 keeps
/// only the winners.
pub const WINNER_RSI14: f64 = 22.0;
pub const LOSER_RSI14: f64 = 27.0;

pub fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 4)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub fn hour(h: i64) -> NaiveDateTime {
    start() + Duration::hours(h)
}

pub fn day(d: i64) -> NaiveDateTime {
    start() + Duration::days(d)
}

fn quiet() -> IndicatorSnapshot {
    IndicatorSnapshot {
        atr: Some(3.0),
        rsi14: Some(50.0),
        rsi5: Some(50.0),
        rsi2: Some(50.0),
        ema_fast: None,
        ema_slow: None,
        vwap: Some(100.0),
    }
}

fn flat_bar(h: i64, indicators: IndicatorSnapshot) -> Bar {
    Bar {
        id: 0,
        symbol: SYMBOL.into(),
        timeframe: TIMEFRAME.into(),
        timestamp: hour(h),
        open: 100.0,
        high: 100.5,
        low: 99.5,
        close: 100.0,
        volume: 1_000.0,
        indicators,
    }
}

/// Hourly bars made of `cycles` ten-bar cycles, each holding one long setup
/// at offset 2. The bar after the entry hits the target (+16 ticks) when
/// `wins(cycle)` holds and the stop (-8 ticks) otherwise. Winners carry
/// [`WINNER_RSI14`], losers [`LOSER_RSI14`].
pub fn cycle_bars(cycles: usize, wins: impl Fn(usize) -> bool) -> Vec<Bar> {
    let mut bars = Vec::with_capacity(cycles * CYCLE);
    for cycle in 0..cycles {
        let win = wins(cycle);
        let rsi14 = if win { WINNER_RSI14 } else { LOSER_RSI14 };
        for pos in 0..CYCLE {
            let h = (cycle * CYCLE + pos) as i64;
            let mut snapshot = quiet();
            match pos {
                1 => {
                    snapshot.rsi14 = Some(rsi14);
                    snapshot.rsi5 = Some(39.0);
                    snapshot.rsi2 = Some(5.0);
                }
                SIGNAL_AT => {
                    snapshot.rsi14 = Some(rsi14);
                    snapshot.rsi5 = Some(42.0);
                    snapshot.rsi2 = Some(12.0);
                }
                _ => {}
            }
            let mut bar = flat_bar(h, snapshot);
            if pos == SIGNAL_AT + 2 {
                if win {
                    bar.high = 104.5;
                    bar.close = 104.0;
                } else {
                    bar.low = 97.5;
                    bar.close = 98.0;
                }
            }
            bars.push(bar);
        }
    }
    bars
}

pub fn alternating(cycle: usize) -> bool {
    cycle % 2 == 0
}

pub fn always(_cycle: usize) -> bool {
    true
}

/// Signal timestamp of `cycle`.
pub fn signal_time(cycle: usize) -> NaiveDateTime {
    hour((cycle * CYCLE + SIGNAL_AT) as i64)
}

pub fn scope() -> Scope {
    Scope::new(vec![SYMBOL.into()], vec![TIMEFRAME.into()])
}

pub fn execution_settings() -> ExecutionSettings {
    ExecutionSettings {
        bracket: BracketParams {
            max_hold_bars: 5,
            ..BracketParams::default()
        },
        ..ExecutionSettings::default()
    }
}

pub fn seeded_store(bars: &[Bar]) -> SqliteAdapter {
    let store = SqliteAdapter::in_memory().unwrap();
    store.initialize_schema().unwrap();
    store.insert_bars(bars).unwrap();
    store
}

/// Scores every candidate the same way.
pub struct StubScorer {
    pub score: f64,
    pub direction: Direction,
}

impl StubScorer {
    pub fn long(score: f64) -> Self {
        StubScorer {
            score,
            direction: Direction::Long,
        }
    }
}

impl DecisionPort for StubScorer {
    fn score(&self, _candidate: &Candidate) -> Result<Decision, BracketeerError> {
        Ok(Decision {
            score: self.score,
            direction: self.direction,
            rationale: "stub".into(),
        })
    }
}

/// Fails every call and counts the attempts.
#[derive(Default)]
pub struct FailingScorer {
    pub calls: Cell<usize>,
}

impl DecisionPort for FailingScorer {
    fn score(&self, candidate: &Candidate) -> Result<Decision, BracketeerError> {
        self.calls.set(self.calls.get() + 1);
        Err(BracketeerError::DecisionUnavailable {
            candidate_id: candidate.id,
            reason: "scorer offline".into(),
        })
    }
}
