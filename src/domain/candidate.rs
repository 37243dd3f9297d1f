//! Entry candidates and the decisions attached to them.

use crate::domain::bar::IndicatorSnapshot;
use crate::domain::side::{Direction, Side};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// What the detector saw when a candidate fired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setup {
    pub symbol: String,
    pub timeframe: String,
    pub timestamp: NaiveDateTime,
    pub bar_id: i64,
    /// The triple-RSI gate that fired.
    pub signal: Side,
    pub indicators: IndicatorSnapshot,
    pub ema_aligned: bool,
    pub volume_surge: bool,
    pub vwap_dev: f64,
}

/// Score and direction produced by the external decision scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub score: f64,
    pub direction: Direction,
    pub rationale: String,
}

/// A persisted setup, optionally scored.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: i64,
    pub setup: Setup,
    pub decision: Option<Decision>,
}

impl Candidate {
    /// The side to trade if the decision clears `threshold`.
    pub fn executable_side(&self, threshold: f64) -> Option<Side> {
        let decision = self.decision.as_ref()?;
        if decision.score >= threshold {
            decision.direction.side()
        } else {
            None
        }
    }
}
