//! Decision scorer port.

use crate::domain::candidate::{Candidate, Decision};
use crate::domain::error::BracketeerError;

/// Attaches a conviction score and direction to a candidate.
///
/// Failures must be reported as [`BracketeerError::DecisionUnavailable`];
/// the candidate then stays unscored and is retried on a later pass.
pub trait DecisionPort {
    fn score(&self, candidate: &Candidate) -> Result<Decision, BracketeerError>;
}
