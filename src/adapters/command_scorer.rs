//! Decision scorer backed by an external program.
//!
//! The candidate is written to the program's stdin as one JSON object. The
//! program must print a JSON object with `score`, `direction` and an optional
//! `rationale` (or `reason`); prose around the object is ignored.

use std::io::Write;
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::candidate::{Candidate, Decision, Setup};
use crate::domain::error::BracketeerError;
use crate::domain::side::Direction;
use crate::ports::decision_port::DecisionPort;

const MAX_RATIONALE_CHARS: usize = 1000;

#[derive(Serialize)]
struct Request<'a> {
    candidate_id: i64,
    #[serde(flatten)]
    setup: &'a Setup,
}

#[derive(Deserialize)]
struct Reply {
    score: f64,
    direction: String,
    #[serde(default, alias = "reason")]
    rationale: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CommandScorer {
    program: String,
    args: Vec<String>,
}

impl CommandScorer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        CommandScorer {
            program: program.into(),
            args,
        }
    }

    /// Split a whitespace-separated command line into program and arguments.
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(|s| s.to_string());
        let program = parts.next()?;
        Some(CommandScorer::new(program, parts.collect()))
    }

    fn invoke(&self, candidate: &Candidate) -> Result<String, BracketeerError> {
        let unavailable = |reason: String| BracketeerError::DecisionUnavailable {
            candidate_id: candidate.id,
            reason,
        };

        let request = serde_json::to_string(&Request {
            candidate_id: candidate.id,
            setup: &candidate.setup,
        })?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| unavailable(format!("failed to start {}: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(request.as_bytes())
                .map_err(|e| unavailable(format!("failed to write request: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| unavailable(format!("failed to read reply: {}", e)))?;
        if !output.status.success() {
            return Err(unavailable(format!("{} exited with {}", self.program, output.status)));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// The outermost `{...}` block of `raw`, parsed as a decision.
pub fn parse_reply(candidate_id: i64, raw: &str) -> Result<Decision, BracketeerError> {
    let unavailable = |reason: String| BracketeerError::DecisionUnavailable {
        candidate_id,
        reason,
    };

    let block = match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if start < end => &raw[start..=end],
        _ => return Err(unavailable("no JSON object in reply".into())),
    };

    let reply: Reply =
        serde_json::from_str(block).map_err(|e| unavailable(format!("malformed reply: {}", e)))?;
    if !reply.score.is_finite() {
        return Err(unavailable("score is not a number".into()));
    }
    let direction: Direction = reply.direction.parse().map_err(unavailable)?;

    let rationale: String = reply
        .rationale
        .unwrap_or_default()
        .trim()
        .chars()
        .take(MAX_RATIONALE_CHARS)
        .collect();

    Ok(Decision {
        score: reply.score,
        direction,
        rationale,
    })
}

impl DecisionPort for CommandScorer {
    fn score(&self, candidate: &Candidate) -> Result<Decision, BracketeerError> {
        let raw = self.invoke(candidate)?;
        debug!(candidate_id = candidate.id, bytes = raw.len(), "scorer replied");
        parse_reply(candidate.id, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::IndicatorSnapshot;
    use crate::domain::side::Side;
    use chrono::NaiveDate;

    fn candidate() -> Candidate {
        Candidate {
            id: 42,
            setup: Setup {
                symbol: "ES".into(),
                timeframe: "1m".into(),
                timestamp: NaiveDate::from_ymd_opt(2024, 2, 1)
                    .unwrap()
                    .and_hms_opt(10, 15, 0)
                    .unwrap(),
                bar_id: 9,
                signal: Side::Long,
                indicators: IndicatorSnapshot::default(),
                ema_aligned: true,
                volume_surge: true,
                vwap_dev: 0.8,
            },
            decision: None,
        }
    }

    fn assert_unavailable(result: Result<Decision, BracketeerError>) {
        match result {
            Err(BracketeerError::DecisionUnavailable { candidate_id, .. }) => {
                assert_eq!(candidate_id, 42)
            }
            other => panic!("expected DecisionUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn parses_reply_wrapped_in_prose() {
        let decision = parse_reply(
            42,
            "Here you go:\n{\"score\": 8.5, \"direction\": \"LONG\", \"reason\": \" strong \"}\nthanks",
        )
        .unwrap();
        assert_eq!(decision.score, 8.5);
        assert_eq!(decision.direction, Direction::Long);
        assert_eq!(decision.rationale, "strong");
    }

    #[test]
    fn missing_rationale_is_empty() {
        let decision = parse_reply(42, r#"{"score": 3, "direction": "none"}"#).unwrap();
        assert_eq!(decision.direction, Direction::NoTrade);
        assert!(decision.rationale.is_empty());
    }

    #[test]
    fn malformed_replies_are_unavailable() {
        assert_unavailable(parse_reply(42, "no idea"));
        assert_unavailable(parse_reply(42, r#"{"direction": "long"}"#));
        assert_unavailable(parse_reply(42, r#"{"score": 7, "direction": "sideways"}"#));
        assert_unavailable(parse_reply(42, "} backwards {"));
    }

    #[test]
    fn from_command_line_splits_arguments() {
        let scorer = CommandScorer::from_command_line("python3 score.py --fast").unwrap();
        assert_eq!(scorer.program, "python3");
        assert_eq!(scorer.args, vec!["score.py", "--fast"]);
        assert!(CommandScorer::from_command_line("   ").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn scores_through_external_program() {
        let scorer = CommandScorer::new(
            "sh",
            vec![
                "-c".into(),
                "cat > /dev/null; echo 'ok {\"score\": 7.5, \"direction\": \"short\"}'".into(),
            ],
        );
        let decision = scorer.score(&candidate()).unwrap();
        assert_eq!(decision.score, 7.5);
        assert_eq!(decision.direction, Direction::Short);
    }

    #[cfg(unix)]
    #[test]
    fn failing_program_is_unavailable() {
        let scorer = CommandScorer::new("sh", vec!["-c".into(), "cat > /dev/null; exit 3".into()]);
        assert_unavailable(scorer.score(&candidate()));

        let scorer = CommandScorer::new("definitely-not-a-real-scorer-binary", Vec::new());
        assert_unavailable(scorer.score(&candidate()));
    }
}
