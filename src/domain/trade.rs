//! Simulated trades.

use crate::domain::filter_config::FilterConfig;
use crate::domain::side::Side;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    Target,
    Stop,
    TimeCap,
}

impl ExitReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ExitReason::Target => "target",
            ExitReason::Stop => "stop",
            ExitReason::TimeCap => "time_cap",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExitReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "target" => Ok(ExitReason::Target),
            "stop" => Ok(ExitReason::Stop),
            "time_cap" => Ok(ExitReason::TimeCap),
            other => Err(format!("unknown exit reason '{}'", other)),
        }
    }
}

/// A trade as produced by the execution simulator, before it has an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrade {
    pub candidate_id: i64,
    pub symbol: String,
    pub timeframe: String,
    pub side: Side,
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,
    pub exit_time: NaiveDateTime,
    pub exit_price: f64,
    pub exit_reason: ExitReason,
    pub stop_price: f64,
    pub target_price: f64,
    pub position_size: i64,
    pub pnl: f64,
    pub pnl_ticks: i64,
    pub mfe: f64,
    pub mae: f64,
    pub bars_held: usize,
    pub filter_config: FilterConfig,
    pub score: f64,
}

/// A persisted, immutable trade.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub id: i64,
    pub record: NewTrade,
}

impl Trade {
    pub fn is_win(&self) -> bool {
        self.record.pnl_ticks >= 0
    }
}
