//! Domain error types.

use std::fmt;

/// A precondition that guards one of the at-most-once invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    CandidateAlreadyTraded(i64),
    TradeAlreadyLabeled(i64),
    CandidateAlreadyScored(i64),
}

impl fmt::Display for Eligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eligibility::CandidateAlreadyTraded(id) => {
                write!(f, "candidate {} already has a trade", id)
            }
            Eligibility::TradeAlreadyLabeled(id) => write!(f, "trade {} already has a label", id),
            Eligibility::CandidateAlreadyScored(id) => {
                write!(f, "candidate {} already has a decision", id)
            }
        }
    }
}

/// Top-level error type for bracketeer.
#[derive(Debug, thiserror::Error)]
pub enum BracketeerError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no bar follows candidate {candidate_id}; deferred until more data arrives")]
    DataGap { candidate_id: i64 },

    #[error("insufficient history at bar {index}: need {required} prior bars")]
    InsufficientHistory { index: usize, required: usize },

    #[error("decision unavailable for candidate {candidate_id}: {reason}")]
    DecisionUnavailable { candidate_id: i64, reason: String },

    #[error("eligibility violation: {0}")]
    EligibilityViolation(Eligibility),

    #[error("no data for {symbol} {timeframe}")]
    NoData { symbol: String, timeframe: String },

    #[error("import error: {reason}")]
    Import { reason: String },

    #[error("optimization report {id} not found")]
    ReportNotFound { id: i64 },

    #[error("optimization report {id} was already reviewed by a human")]
    ReportAlreadyReviewed { id: i64 },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BracketeerError {
    /// Errors scoped to a single record; batch stages count them and move on.
    pub fn is_per_record(&self) -> bool {
        matches!(
            self,
            BracketeerError::DataGap { .. }
                | BracketeerError::InsufficientHistory { .. }
                | BracketeerError::DecisionUnavailable { .. }
                | BracketeerError::EligibilityViolation(_)
        )
    }
}

impl From<&BracketeerError> for std::process::ExitCode {
    fn from(err: &BracketeerError) -> Self {
        let code: u8 = match err {
            BracketeerError::Io(_) | BracketeerError::Import { .. } => 1,
            BracketeerError::ConfigParse { .. }
            | BracketeerError::ConfigMissing { .. }
            | BracketeerError::ConfigInvalid { .. } => 2,
            BracketeerError::Database { .. }
            | BracketeerError::DatabaseQuery { .. }
            | BracketeerError::Serialization(_) => 3,
            BracketeerError::ReportNotFound { .. } | BracketeerError::ReportAlreadyReviewed { .. } => {
                4
            }
            BracketeerError::NoData { .. }
            | BracketeerError::DataGap { .. }
            | BracketeerError::InsufficientHistory { .. } => 5,
            BracketeerError::DecisionUnavailable { .. } | BracketeerError::EligibilityViolation(_) => {
                6
            }
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_record_errors_are_flagged() {
        assert!(BracketeerError::DataGap { candidate_id: 3 }.is_per_record());
        assert!(
            BracketeerError::EligibilityViolation(Eligibility::TradeAlreadyLabeled(1)).is_per_record()
        );
        assert!(
            !BracketeerError::Database {
                reason: "gone".into()
            }
            .is_per_record()
        );
    }

    #[test]
    fn eligibility_display_names_the_record() {
        let err = BracketeerError::EligibilityViolation(Eligibility::CandidateAlreadyTraded(42));
        assert_eq!(
            err.to_string(),
            "eligibility violation: candidate 42 already has a trade"
        );
    }

    #[test]
    fn config_missing_display() {
        let err = BracketeerError::ConfigMissing {
            section: "sqlite".into(),
            key: "path".into(),
        };
        assert_eq!(err.to_string(), "missing config key [sqlite] path");
    }
}
