//! In-memory journal.
//!
//! Holds candidates, trades and labels for one process. Used to evaluate
//! configurations without touching the shared store, and as a test double.

use std::cell::RefCell;

use crate::domain::candidate::{Candidate, Decision, Setup};
use crate::domain::error::{BracketeerError, Eligibility};
use crate::domain::label::{Label, NewLabel};
use crate::domain::scope::Scope;
use crate::domain::trade::{NewTrade, Trade};
use crate::domain::window::TimeWindow;
use crate::ports::journal_port::{ExecutionQuery, JournalPort};

#[derive(Debug, Default)]
struct State {
    candidates: Vec<Candidate>,
    trades: Vec<Trade>,
    labels: Vec<Label>,
    last_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

#[derive(Debug, Default)]
pub struct MemoryJournal {
    state: RefCell<State>,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn candidate_count(&self) -> usize {
        self.state.borrow().candidates.len()
    }

    pub fn trade_count(&self) -> usize {
        self.state.borrow().trades.len()
    }
}

fn sorted_candidates(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        a.setup
            .timestamp
            .cmp(&b.setup.timestamp)
            .then(a.id.cmp(&b.id))
    });
    candidates
}

fn sorted_trades(mut trades: Vec<Trade>) -> Vec<Trade> {
    trades.sort_by(|a, b| {
        a.record
            .entry_time
            .cmp(&b.record.entry_time)
            .then(a.id.cmp(&b.id))
    });
    trades
}

fn in_window(window: Option<&TimeWindow>, candidate: &Candidate) -> bool {
    window.is_none_or(|w| w.contains(candidate.setup.timestamp))
}

impl JournalPort for MemoryJournal {
    fn insert_candidate(&self, setup: &Setup) -> Result<Option<i64>, BracketeerError> {
        let mut state = self.state.borrow_mut();
        let duplicate = state.candidates.iter().any(|c| {
            c.setup.symbol == setup.symbol
                && c.setup.timeframe == setup.timeframe
                && c.setup.timestamp == setup.timestamp
        });
        if duplicate {
            return Ok(None);
        }

        let id = state.next_id();
        state.candidates.push(Candidate {
            id,
            setup: setup.clone(),
            decision: None,
        });
        Ok(Some(id))
    }

    fn candidate(&self, id: i64) -> Result<Option<Candidate>, BracketeerError> {
        Ok(self
            .state
            .borrow()
            .candidates
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    fn unscored_candidates(
        &self,
        scope: &Scope,
        window: Option<&TimeWindow>,
    ) -> Result<Vec<Candidate>, BracketeerError> {
        let state = self.state.borrow();
        let selected = state
            .candidates
            .iter()
            .filter(|c| c.decision.is_none())
            .filter(|c| scope.includes(&c.setup.symbol, &c.setup.timeframe))
            .filter(|c| in_window(window, c))
            .cloned()
            .collect();
        Ok(sorted_candidates(selected))
    }

    fn record_decision(&self, candidate_id: i64, decision: &Decision) -> Result<(), BracketeerError> {
        let mut state = self.state.borrow_mut();
        let candidate = state
            .candidates
            .iter_mut()
            .find(|c| c.id == candidate_id)
            .ok_or_else(|| BracketeerError::DatabaseQuery {
                reason: format!("candidate {} not found", candidate_id),
            })?;
        if candidate.decision.is_some() {
            return Err(BracketeerError::EligibilityViolation(
                Eligibility::CandidateAlreadyScored(candidate_id),
            ));
        }
        candidate.decision = Some(decision.clone());
        Ok(())
    }

    fn executable_candidates(
        &self,
        query: &ExecutionQuery<'_>,
    ) -> Result<Vec<Candidate>, BracketeerError> {
        let state = self.state.borrow();
        let selected = state
            .candidates
            .iter()
            .filter(|c| c.executable_side(query.min_score).is_some())
            .filter(|c| !state.trades.iter().any(|t| t.record.candidate_id == c.id))
            .filter(|c| query.scope.includes(&c.setup.symbol, &c.setup.timeframe))
            .filter(|c| in_window(query.window, c))
            .cloned()
            .collect();
        Ok(sorted_candidates(selected))
    }

    fn insert_trade(&self, trade: &NewTrade) -> Result<i64, BracketeerError> {
        let mut state = self.state.borrow_mut();
        if state
            .trades
            .iter()
            .any(|t| t.record.candidate_id == trade.candidate_id)
        {
            return Err(BracketeerError::EligibilityViolation(
                Eligibility::CandidateAlreadyTraded(trade.candidate_id),
            ));
        }

        let id = state.next_id();
        state.trades.push(Trade {
            id,
            record: trade.clone(),
        });
        Ok(id)
    }

    fn trades_between(
        &self,
        scope: &Scope,
        window: &TimeWindow,
    ) -> Result<Vec<Trade>, BracketeerError> {
        let state = self.state.borrow();
        let selected = state
            .trades
            .iter()
            .filter(|t| window.contains(t.record.entry_time))
            .filter(|t| scope.includes(&t.record.symbol, &t.record.timeframe))
            .cloned()
            .collect();
        Ok(sorted_trades(selected))
    }

    fn unlabeled_trades(&self) -> Result<Vec<Trade>, BracketeerError> {
        let state = self.state.borrow();
        let selected = state
            .trades
            .iter()
            .filter(|t| !state.labels.iter().any(|l| l.record.trade_id == t.id))
            .cloned()
            .collect();
        Ok(sorted_trades(selected))
    }

    fn insert_label(&self, label: &NewLabel) -> Result<i64, BracketeerError> {
        let mut state = self.state.borrow_mut();
        if state
            .labels
            .iter()
            .any(|l| l.record.trade_id == label.trade_id)
        {
            return Err(BracketeerError::EligibilityViolation(
                Eligibility::TradeAlreadyLabeled(label.trade_id),
            ));
        }

        let id = state.next_id();
        state.labels.push(Label {
            id,
            record: label.clone(),
        });
        Ok(id)
    }

    fn labels(&self) -> Result<Vec<Label>, BracketeerError> {
        Ok(self.state.borrow().labels.clone())
    }

    fn purge_window(&self, scope: &Scope, window: &TimeWindow) -> Result<usize, BracketeerError> {
        let mut state = self.state.borrow_mut();
        let purged: Vec<i64> = state
            .candidates
            .iter()
            .filter(|c| window.contains(c.setup.timestamp))
            .filter(|c| scope.includes(&c.setup.symbol, &c.setup.timeframe))
            .map(|c| c.id)
            .collect();

        let trade_ids: Vec<i64> = state
            .trades
            .iter()
            .filter(|t| purged.contains(&t.record.candidate_id))
            .map(|t| t.id)
            .collect();

        state.labels.retain(|l| !trade_ids.contains(&l.record.trade_id));
        state.trades.retain(|t| !trade_ids.contains(&t.id));
        state.candidates.retain(|c| !purged.contains(&c.id));
        Ok(purged.len())
    }
}
