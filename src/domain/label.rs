//! Training labels derived from closed trades.

use crate::domain::bar::IndicatorSnapshot;
use crate::domain::candidate::Candidate;
use crate::domain::side::{Direction, Side};
use crate::domain::trade::{ExitReason, Trade};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Favorable,
    Unfavorable,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Favorable => "favorable",
            Outcome::Unfavorable => "unfavorable",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "favorable" => Ok(Outcome::Favorable),
            "unfavorable" => Ok(Outcome::Unfavorable),
            other => Err(format!("unknown outcome '{}'", other)),
        }
    }
}

/// Frozen copy of the candidate's setup at labeling time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupContext {
    pub symbol: String,
    pub timeframe: String,
    pub signal: Side,
    pub indicators: IndicatorSnapshot,
    pub ema_aligned: bool,
    pub volume_surge: bool,
    pub vwap_dev: f64,
    pub score: Option<f64>,
    pub direction: Option<Direction>,
}

impl From<&Candidate> for SetupContext {
    fn from(candidate: &Candidate) -> Self {
        let setup = &candidate.setup;
        SetupContext {
            symbol: setup.symbol.clone(),
            timeframe: setup.timeframe.clone(),
            signal: setup.signal,
            indicators: setup.indicators,
            ema_aligned: setup.ema_aligned,
            volume_surge: setup.volume_surge,
            vwap_dev: setup.vwap_dev,
            score: candidate.decision.as_ref().map(|d| d.score),
            direction: candidate.decision.as_ref().map(|d| d.direction),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewLabel {
    pub trade_id: i64,
    pub outcome: Outcome,
    pub win: bool,
    pub pnl: f64,
    pub mfe_ratio: Option<f64>,
    pub mae_ratio: Option<f64>,
    pub bars_to_target: Option<usize>,
    pub bars_to_stop: Option<usize>,
    pub setup_context: Option<SetupContext>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub id: i64,
    pub record: NewLabel,
}

/// Classify a trade by how it closed.
pub fn classify(trade: &Trade) -> Outcome {
    match trade.record.exit_reason {
        ExitReason::Target => Outcome::Favorable,
        ExitReason::Stop => Outcome::Unfavorable,
        ExitReason::TimeCap if trade.record.pnl_ticks >= 0 => Outcome::Favorable,
        ExitReason::TimeCap => Outcome::Unfavorable,
    }
}

/// Build the label for `trade`.
///
/// `entry_atr` is the ATR recorded on the candidate's source bar; the
/// excursion ratios are absent when it is missing or zero.
pub fn label_trade(trade: &Trade, candidate: Option<&Candidate>, entry_atr: Option<f64>) -> NewLabel {
    let outcome = classify(trade);
    let record = &trade.record;
    let atr = entry_atr.filter(|a| *a != 0.0 && a.is_finite());

    NewLabel {
        trade_id: trade.id,
        outcome,
        win: outcome == Outcome::Favorable,
        pnl: record.pnl,
        mfe_ratio: atr.map(|a| record.mfe / a),
        mae_ratio: atr.map(|a| record.mae / a),
        bars_to_target: (record.exit_reason == ExitReason::Target).then_some(record.bars_held),
        bars_to_stop: (record.exit_reason == ExitReason::Stop).then_some(record.bars_held),
        setup_context: candidate.map(SetupContext::from),
    }
}
