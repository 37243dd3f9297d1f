//! Deterministic decision scorer built from a setup's own flags.

use crate::domain::candidate::{Candidate, Decision};
use crate::domain::error::BracketeerError;
use crate::domain::side::Direction;
use crate::ports::decision_port::DecisionPort;

const BASE_SCORE: f64 = 6.0;
const VWAP_WEIGHT: f64 = 0.5;
const VWAP_CAP: f64 = 2.0;

/// Scores 6 plus one point each for EMA alignment and a volume surge, plus
/// half a point per ATR of VWAP deviation (capped at two ATRs). The
/// direction is the side of the gate that fired.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleScorer;

impl DecisionPort for RuleScorer {
    fn score(&self, candidate: &Candidate) -> Result<Decision, BracketeerError> {
        let setup = &candidate.setup;
        let mut score = BASE_SCORE;
        let mut reasons = Vec::new();

        if setup.ema_aligned {
            score += 1.0;
            reasons.push("ema aligned".to_string());
        }
        if setup.volume_surge {
            score += 1.0;
            reasons.push("volume surge".to_string());
        }
        let vwap = setup.vwap_dev.abs().min(VWAP_CAP);
        if vwap > 0.0 {
            score += VWAP_WEIGHT * vwap;
            reasons.push(format!("vwap dev {:.2} atr", setup.vwap_dev));
        }

        let rationale = if reasons.is_empty() {
            format!("{} gate only", setup.signal)
        } else {
            format!("{} gate, {}", setup.signal, reasons.join(", "))
        };

        Ok(Decision {
            score,
            direction: Direction::from(setup.signal),
            rationale,
        })
    }
}
