//! SQLite store adapter.
//!
//! Implements every store port on one pooled database. Each record's state
//! transition commits in its own transaction, and the at-most-once rules are
//! checked inside that transaction and backed by unique constraints.

use crate::domain::bar::{Bar, IndicatorSnapshot, TIMESTAMP_FORMAT};
use crate::domain::candidate::{Candidate, Decision, Setup};
use crate::domain::error::{BracketeerError, Eligibility};
use crate::domain::filter_config::FilterConfig;
use crate::domain::filter_history::FilterHistory;
use crate::domain::label::{Label, NewLabel};
use crate::domain::metrics::Metrics;
use crate::domain::report::{Approval, NewReport, OptimizationReport};
use crate::domain::scope::Scope;
use crate::domain::trade::{NewTrade, Trade};
use crate::domain::window::{Split, TimeWindow};
use crate::ports::candle_port::CandlePort;
use crate::ports::config_port::ConfigPort;
use crate::ports::filter_store_port::FilterStorePort;
use crate::ports::journal_port::{ExecutionQuery, JournalPort};
use crate::ports::report_port::ReportPort;
use chrono::{NaiveDateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Type;
use rusqlite::{OptionalExtension, Row, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::str::FromStr;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS candles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    symbol TEXT NOT NULL,
    timeframe TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    open REAL NOT NULL,
    high REAL NOT NULL,
    low REAL NOT NULL,
    close REAL NOT NULL,
    volume REAL NOT NULL,
    atr REAL,
    rsi14 REAL,
    rsi5 REAL,
    rsi2 REAL,
    ema_fast REAL,
    ema_slow REAL,
    vwap REAL,
    UNIQUE (symbol, timeframe, timestamp)
);
CREATE TABLE IF NOT EXISTS candidates (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    symbol TEXT NOT NULL,
    timeframe TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    candle_id INTEGER NOT NULL,
    signal TEXT NOT NULL,
    indicators TEXT NOT NULL,
    ema_aligned INTEGER NOT NULL,
    volume_surge INTEGER NOT NULL,
    vwap_dev REAL NOT NULL,
    score REAL,
    direction TEXT,
    rationale TEXT,
    UNIQUE (symbol, timeframe, timestamp)
);
CREATE INDEX IF NOT EXISTS idx_candidates_timestamp ON candidates(timestamp);
CREATE TABLE IF NOT EXISTS trades (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    candidate_id INTEGER NOT NULL UNIQUE,
    symbol TEXT NOT NULL,
    timeframe TEXT NOT NULL,
    side TEXT NOT NULL,
    entry_time TEXT NOT NULL,
    entry_price REAL NOT NULL,
    exit_time TEXT NOT NULL,
    exit_price REAL NOT NULL,
    exit_reason TEXT NOT NULL,
    stop_price REAL NOT NULL,
    target_price REAL NOT NULL,
    position_size INTEGER NOT NULL,
    pnl REAL NOT NULL,
    pnl_ticks INTEGER NOT NULL,
    mfe REAL NOT NULL,
    mae REAL NOT NULL,
    bars_held INTEGER NOT NULL,
    filter_config TEXT NOT NULL,
    score REAL NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_trades_entry_time ON trades(entry_time);
CREATE TABLE IF NOT EXISTS labels (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    trade_id INTEGER NOT NULL UNIQUE,
    outcome TEXT NOT NULL,
    win INTEGER NOT NULL,
    pnl REAL NOT NULL,
    mfe_ratio REAL,
    mae_ratio REAL,
    bars_to_target INTEGER,
    bars_to_stop INTEGER,
    setup_context TEXT
);
CREATE TABLE IF NOT EXISTS filter_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    version INTEGER NOT NULL,
    config TEXT NOT NULL,
    reason TEXT NOT NULL,
    metrics TEXT,
    active INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    deactivated_at TEXT
);
CREATE TABLE IF NOT EXISTS optimization_reports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at TEXT NOT NULL,
    train_start TEXT NOT NULL,
    train_end TEXT NOT NULL,
    test_start TEXT NOT NULL,
    test_end TEXT NOT NULL,
    symbols TEXT NOT NULL,
    timeframes TEXT NOT NULL,
    old_config TEXT NOT NULL,
    new_config TEXT NOT NULL,
    train_results TEXT NOT NULL,
    test_results TEXT NOT NULL,
    accepted INTEGER NOT NULL,
    significance REAL NOT NULL,
    reasoning TEXT NOT NULL,
    approved INTEGER,
    approved_by TEXT,
    rejection_reason TEXT,
    reviewed_at TEXT
);";

const CANDLE_COLUMNS: &str = "id, symbol, timeframe, timestamp, open, high, low, close, volume, \
     atr, rsi14, rsi5, rsi2, ema_fast, ema_slow, vwap";

const CANDIDATE_COLUMNS: &str = "id, symbol, timeframe, timestamp, candle_id, signal, indicators, \
     ema_aligned, volume_surge, vwap_dev, score, direction, rationale";

const TRADE_COLUMNS: &str = "id, candidate_id, symbol, timeframe, side, entry_time, entry_price, \
     exit_time, exit_price, exit_reason, stop_price, target_price, position_size, pnl, pnl_ticks, \
     mfe, mae, bars_held, filter_config, score";

const LABEL_COLUMNS: &str = "id, trade_id, outcome, win, pnl, mfe_ratio, mae_ratio, \
     bars_to_target, bars_to_stop, setup_context";

const HISTORY_COLUMNS: &str =
    "id, version, config, reason, metrics, active, created_at, deactivated_at";

const REPORT_COLUMNS: &str = "id, created_at, train_start, train_end, test_start, test_end, \
     symbols, timeframes, old_config, new_config, train_results, test_results, accepted, \
     significance, reasoning, approved, approved_by, rejection_reason, reviewed_at";

fn db_err(e: r2d2::Error) -> BracketeerError {
    BracketeerError::Database {
        reason: e.to_string(),
    }
}

fn query_err(e: rusqlite::Error) -> BracketeerError {
    BracketeerError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn fmt_ts(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn conversion_failure<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into())
}

fn ts_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(|e| conversion_failure(idx, e))
}

fn opt_ts_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDateTime>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT).map_err(|e| conversion_failure(idx, e)))
        .transpose()
}

fn json_at<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion_failure(idx, e))
}

fn opt_json_at<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| serde_json::from_str(&s).map_err(|e| conversion_failure(idx, e)))
        .transpose()
}

fn parsed_at<T: FromStr<Err = String>>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e: String| conversion_failure(idx, e))
}

fn opt_parsed_at<T: FromStr<Err = String>>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| s.parse().map_err(|e: String| conversion_failure(idx, e)))
        .transpose()
}

fn count_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<usize> {
    Ok(row.get::<_, i64>(idx)?.max(0) as usize)
}

fn to_json<T: Serialize>(value: &T) -> Result<String, BracketeerError> {
    Ok(serde_json::to_string(value)?)
}

fn bar_from_row(row: &Row<'_>) -> rusqlite::Result<Bar> {
    Ok(Bar {
        id: row.get(0)?,
        symbol: row.get(1)?,
        timeframe: row.get(2)?,
        timestamp: ts_at(row, 3)?,
        open: row.get(4)?,
        high: row.get(5)?,
        low: row.get(6)?,
        close: row.get(7)?,
        volume: row.get(8)?,
        indicators: IndicatorSnapshot {
            atr: row.get(9)?,
            rsi14: row.get(10)?,
            rsi5: row.get(11)?,
            rsi2: row.get(12)?,
            ema_fast: row.get(13)?,
            ema_slow: row.get(14)?,
            vwap: row.get(15)?,
        },
    })
}

fn candidate_from_row(row: &Row<'_>) -> rusqlite::Result<Candidate> {
    let score: Option<f64> = row.get(10)?;
    let direction = opt_parsed_at(row, 11)?;
    let rationale: Option<String> = row.get(12)?;
    let decision = match (score, direction) {
        (Some(score), Some(direction)) => Some(Decision {
            score,
            direction,
            rationale: rationale.unwrap_or_default(),
        }),
        _ => None,
    };

    Ok(Candidate {
        id: row.get(0)?,
        setup: Setup {
            symbol: row.get(1)?,
            timeframe: row.get(2)?,
            timestamp: ts_at(row, 3)?,
            bar_id: row.get(4)?,
            signal: parsed_at(row, 5)?,
            indicators: json_at(row, 6)?,
            ema_aligned: row.get(7)?,
            volume_surge: row.get(8)?,
            vwap_dev: row.get(9)?,
        },
        decision,
    })
}

fn trade_from_row(row: &Row<'_>) -> rusqlite::Result<Trade> {
    Ok(Trade {
        id: row.get(0)?,
        record: NewTrade {
            candidate_id: row.get(1)?,
            symbol: row.get(2)?,
            timeframe: row.get(3)?,
            side: parsed_at(row, 4)?,
            entry_time: ts_at(row, 5)?,
            entry_price: row.get(6)?,
            exit_time: ts_at(row, 7)?,
            exit_price: row.get(8)?,
            exit_reason: parsed_at(row, 9)?,
            stop_price: row.get(10)?,
            target_price: row.get(11)?,
            position_size: row.get(12)?,
            pnl: row.get(13)?,
            pnl_ticks: row.get(14)?,
            mfe: row.get(15)?,
            mae: row.get(16)?,
            bars_held: count_at(row, 17)?,
            filter_config: json_at(row, 18)?,
            score: row.get(19)?,
        },
    })
}

fn label_from_row(row: &Row<'_>) -> rusqlite::Result<Label> {
    let bars_to_target: Option<i64> = row.get(7)?;
    let bars_to_stop: Option<i64> = row.get(8)?;
    Ok(Label {
        id: row.get(0)?,
        record: NewLabel {
            trade_id: row.get(1)?,
            outcome: parsed_at(row, 2)?,
            win: row.get(3)?,
            pnl: row.get(4)?,
            mfe_ratio: row.get(5)?,
            mae_ratio: row.get(6)?,
            bars_to_target: bars_to_target.map(|n| n.max(0) as usize),
            bars_to_stop: bars_to_stop.map(|n| n.max(0) as usize),
            setup_context: opt_json_at(row, 9)?,
        },
    })
}

fn history_from_row(row: &Row<'_>) -> rusqlite::Result<FilterHistory> {
    Ok(FilterHistory {
        id: row.get(0)?,
        version: row.get(1)?,
        config: json_at(row, 2)?,
        reason: row.get(3)?,
        metrics: opt_json_at(row, 4)?,
        active: row.get(5)?,
        created_at: ts_at(row, 6)?,
        deactivated_at: opt_ts_at(row, 7)?,
    })
}

fn report_from_row(row: &Row<'_>) -> rusqlite::Result<OptimizationReport> {
    Ok(OptimizationReport {
        id: row.get(0)?,
        record: NewReport {
            created_at: ts_at(row, 1)?,
            split: Split {
                train: TimeWindow::new(ts_at(row, 2)?, ts_at(row, 3)?),
                test: TimeWindow::new(ts_at(row, 4)?, ts_at(row, 5)?),
            },
            symbols: json_at(row, 6)?,
            timeframes: json_at(row, 7)?,
            old_config: json_at(row, 8)?,
            new_config: json_at(row, 9)?,
            train: json_at(row, 10)?,
            test: json_at(row, 11)?,
            accepted: row.get(12)?,
            significance: row.get(13)?,
            reasoning: row.get(14)?,
            approval: Approval {
                approved: row.get(15)?,
                approved_by: opt_parsed_at(row, 16)?,
                rejection_reason: row.get(17)?,
                reviewed_at: opt_ts_at(row, 18)?,
            },
        },
    })
}

fn collect_rows<T>(
    rows: impl Iterator<Item = rusqlite::Result<T>>,
) -> Result<Vec<T>, BracketeerError> {
    rows.map(|r| r.map_err(query_err)).collect()
}

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, BracketeerError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| BracketeerError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(db_err)?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, BracketeerError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager).map_err(db_err)?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, BracketeerError> {
        self.pool.get().map_err(db_err)
    }

    pub fn initialize_schema(&self) -> Result<(), BracketeerError> {
        self.conn()?.execute_batch(SCHEMA).map_err(query_err)
    }
}

impl CandlePort for SqliteAdapter {
    fn get_bars(
        &self,
        symbol: &str,
        timeframe: &str,
        since: Option<NaiveDateTime>,
        limit: Option<usize>,
    ) -> Result<Vec<Bar>, BracketeerError> {
        let conn = self.conn()?;
        let query = format!(
            "SELECT {} FROM candles
             WHERE symbol = ?1 AND timeframe = ?2 AND (?3 IS NULL OR timestamp >= ?3)
             ORDER BY timestamp ASC LIMIT ?4",
            CANDLE_COLUMNS
        );
        let mut stmt = conn.prepare(&query).map_err(query_err)?;
        let limit = limit.map(|n| n as i64).unwrap_or(-1);
        let rows = stmt
            .query_map(
                params![symbol, timeframe, since.as_ref().map(fmt_ts), limit],
                bar_from_row,
            )
            .map_err(query_err)?;
        collect_rows(rows)
    }

    fn bars_after(
        &self,
        symbol: &str,
        timeframe: &str,
        after: NaiveDateTime,
        limit: usize,
    ) -> Result<Vec<Bar>, BracketeerError> {
        let conn = self.conn()?;
        let query = format!(
            "SELECT {} FROM candles
             WHERE symbol = ?1 AND timeframe = ?2 AND timestamp > ?3
             ORDER BY timestamp ASC LIMIT ?4",
            CANDLE_COLUMNS
        );
        let mut stmt = conn.prepare(&query).map_err(query_err)?;
        let rows = stmt
            .query_map(
                params![symbol, timeframe, fmt_ts(&after), limit as i64],
                bar_from_row,
            )
            .map_err(query_err)?;
        collect_rows(rows)
    }

    fn bars_before(
        &self,
        symbol: &str,
        timeframe: &str,
        before: NaiveDateTime,
        limit: usize,
    ) -> Result<Vec<Bar>, BracketeerError> {
        let conn = self.conn()?;
        let query = format!(
            "SELECT {} FROM candles
             WHERE symbol = ?1 AND timeframe = ?2 AND timestamp < ?3
             ORDER BY timestamp DESC LIMIT ?4",
            CANDLE_COLUMNS
        );
        let mut stmt = conn.prepare(&query).map_err(query_err)?;
        let rows = stmt
            .query_map(
                params![symbol, timeframe, fmt_ts(&before), limit as i64],
                bar_from_row,
            )
            .map_err(query_err)?;
        let mut bars = collect_rows(rows)?;
        bars.reverse();
        Ok(bars)
    }

    fn bar_by_id(&self, id: i64) -> Result<Option<Bar>, BracketeerError> {
        let conn = self.conn()?;
        let query = format!("SELECT {} FROM candles WHERE id = ?1", CANDLE_COLUMNS);
        conn.query_row(&query, params![id], bar_from_row)
            .optional()
            .map_err(query_err)
    }

    fn has_bars_in(
        &self,
        symbol: &str,
        timeframe: &str,
        window: &TimeWindow,
    ) -> Result<bool, BracketeerError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM candles
             WHERE symbol = ?1 AND timeframe = ?2 AND timestamp >= ?3 AND timestamp < ?4)",
            params![symbol, timeframe, fmt_ts(&window.start), fmt_ts(&window.end)],
            |row| row.get(0),
        )
        .map_err(query_err)
    }

    fn data_range(
        &self,
        symbol: &str,
        timeframe: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, BracketeerError> {
        let conn = self.conn()?;
        let result: (Option<String>, Option<String>, i64) = conn
            .query_row(
                "SELECT MIN(timestamp), MAX(timestamp), COUNT(*) FROM candles
                 WHERE symbol = ?1 AND timeframe = ?2",
                params![symbol, timeframe],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(query_err)?;

        let parse = |s: &str| {
            NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).map_err(|e| {
                BracketeerError::Database {
                    reason: e.to_string(),
                }
            })
        };

        match result {
            (Some(min), Some(max), count) if count > 0 => {
                Ok(Some((parse(&min)?, parse(&max)?, count as usize)))
            }
            _ => Ok(None),
        }
    }

    fn insert_bars(&self, bars: &[Bar]) -> Result<usize, BracketeerError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;
        let mut inserted = 0;

        for bar in bars {
            let s = &bar.indicators;
            inserted += tx
                .execute(
                    "INSERT OR IGNORE INTO candles (symbol, timeframe, timestamp, open, high, low,
                     close, volume, atr, rsi14, rsi5, rsi2, ema_fast, ema_slow, vwap)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                    params![
                        bar.symbol,
                        bar.timeframe,
                        fmt_ts(&bar.timestamp),
                        bar.open,
                        bar.high,
                        bar.low,
                        bar.close,
                        bar.volume,
                        s.atr,
                        s.rsi14,
                        s.rsi5,
                        s.rsi2,
                        s.ema_fast,
                        s.ema_slow,
                        s.vwap
                    ],
                )
                .map_err(query_err)?;
        }

        tx.commit().map_err(query_err)?;
        Ok(inserted)
    }
}

impl JournalPort for SqliteAdapter {
    fn insert_candidate(&self, setup: &Setup) -> Result<Option<i64>, BracketeerError> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "INSERT OR IGNORE INTO candidates (symbol, timeframe, timestamp, candle_id, signal,
                 indicators, ema_aligned, volume_surge, vwap_dev)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    setup.symbol,
                    setup.timeframe,
                    fmt_ts(&setup.timestamp),
                    setup.bar_id,
                    setup.signal.as_str(),
                    to_json(&setup.indicators)?,
                    setup.ema_aligned,
                    setup.volume_surge,
                    setup.vwap_dev
                ],
            )
            .map_err(query_err)?;

        Ok((changed > 0).then(|| conn.last_insert_rowid()))
    }

    fn candidate(&self, id: i64) -> Result<Option<Candidate>, BracketeerError> {
        let conn = self.conn()?;
        let query = format!("SELECT {} FROM candidates WHERE id = ?1", CANDIDATE_COLUMNS);
        conn.query_row(&query, params![id], candidate_from_row)
            .optional()
            .map_err(query_err)
    }

    fn unscored_candidates(
        &self,
        scope: &Scope,
        window: Option<&TimeWindow>,
    ) -> Result<Vec<Candidate>, BracketeerError> {
        let conn = self.conn()?;
        let query = format!(
            "SELECT {} FROM candidates
             WHERE direction IS NULL
               AND (?1 IS NULL OR timestamp >= ?1) AND (?2 IS NULL OR timestamp < ?2)
             ORDER BY timestamp ASC, id ASC",
            CANDIDATE_COLUMNS
        );
        let mut stmt = conn.prepare(&query).map_err(query_err)?;
        let rows = stmt
            .query_map(
                params![
                    window.map(|w| fmt_ts(&w.start)),
                    window.map(|w| fmt_ts(&w.end))
                ],
                candidate_from_row,
            )
            .map_err(query_err)?;
        let mut candidates = collect_rows(rows)?;
        candidates.retain(|c| scope.includes(&c.setup.symbol, &c.setup.timeframe));
        Ok(candidates)
    }

    fn record_decision(&self, candidate_id: i64, decision: &Decision) -> Result<(), BracketeerError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;

        let existing: Option<Option<String>> = tx
            .query_row(
                "SELECT direction FROM candidates WHERE id = ?1",
                params![candidate_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(query_err)?;

        match existing {
            None => {
                return Err(BracketeerError::DatabaseQuery {
                    reason: format!("candidate {} not found", candidate_id),
                });
            }
            Some(Some(_)) => {
                return Err(BracketeerError::EligibilityViolation(
                    Eligibility::CandidateAlreadyScored(candidate_id),
                ));
            }
            Some(None) => {}
        }

        tx.execute(
            "UPDATE candidates SET score = ?1, direction = ?2, rationale = ?3 WHERE id = ?4",
            params![
                decision.score,
                decision.direction.as_str(),
                decision.rationale,
                candidate_id
            ],
        )
        .map_err(query_err)?;

        tx.commit().map_err(query_err)
    }

    fn executable_candidates(
        &self,
        query: &ExecutionQuery<'_>,
    ) -> Result<Vec<Candidate>, BracketeerError> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM candidates c
             WHERE c.direction IN ('long', 'short') AND c.score >= ?1
               AND NOT EXISTS (SELECT 1 FROM trades t WHERE t.candidate_id = c.id)
               AND (?2 IS NULL OR c.timestamp >= ?2) AND (?3 IS NULL OR c.timestamp < ?3)
             ORDER BY c.timestamp ASC, c.id ASC",
            CANDIDATE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql).map_err(query_err)?;
        let rows = stmt
            .query_map(
                params![
                    query.min_score,
                    query.window.map(|w| fmt_ts(&w.start)),
                    query.window.map(|w| fmt_ts(&w.end))
                ],
                candidate_from_row,
            )
            .map_err(query_err)?;
        let mut candidates = collect_rows(rows)?;
        candidates.retain(|c| query.scope.includes(&c.setup.symbol, &c.setup.timeframe));
        Ok(candidates)
    }

    fn insert_trade(&self, trade: &NewTrade) -> Result<i64, BracketeerError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;

        let exists: bool = tx
            .query_row(
                "SELECT EXISTS (SELECT 1 FROM trades WHERE candidate_id = ?1)",
                params![trade.candidate_id],
                |row| row.get(0),
            )
            .map_err(query_err)?;
        if exists {
            return Err(BracketeerError::EligibilityViolation(
                Eligibility::CandidateAlreadyTraded(trade.candidate_id),
            ));
        }

        tx.execute(
            "INSERT INTO trades (candidate_id, symbol, timeframe, side, entry_time, entry_price,
             exit_time, exit_price, exit_reason, stop_price, target_price, position_size, pnl,
             pnl_ticks, mfe, mae, bars_held, filter_config, score)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
             ?18, ?19)",
            params![
                trade.candidate_id,
                trade.symbol,
                trade.timeframe,
                trade.side.as_str(),
                fmt_ts(&trade.entry_time),
                trade.entry_price,
                fmt_ts(&trade.exit_time),
                trade.exit_price,
                trade.exit_reason.as_str(),
                trade.stop_price,
                trade.target_price,
                trade.position_size,
                trade.pnl,
                trade.pnl_ticks,
                trade.mfe,
                trade.mae,
                trade.bars_held as i64,
                to_json(&trade.filter_config)?,
                trade.score
            ],
        )
        .map_err(query_err)?;
        let id = tx.last_insert_rowid();

        tx.commit().map_err(query_err)?;
        Ok(id)
    }

    fn trades_between(
        &self,
        scope: &Scope,
        window: &TimeWindow,
    ) -> Result<Vec<Trade>, BracketeerError> {
        let conn = self.conn()?;
        let query = format!(
            "SELECT {} FROM trades WHERE entry_time >= ?1 AND entry_time < ?2
             ORDER BY entry_time ASC, id ASC",
            TRADE_COLUMNS
        );
        let mut stmt = conn.prepare(&query).map_err(query_err)?;
        let rows = stmt
            .query_map(
                params![fmt_ts(&window.start), fmt_ts(&window.end)],
                trade_from_row,
            )
            .map_err(query_err)?;
        let mut trades = collect_rows(rows)?;
        trades.retain(|t| scope.includes(&t.record.symbol, &t.record.timeframe));
        Ok(trades)
    }

    fn unlabeled_trades(&self) -> Result<Vec<Trade>, BracketeerError> {
        let conn = self.conn()?;
        let query = format!(
            "SELECT {} FROM trades t
             WHERE NOT EXISTS (SELECT 1 FROM labels l WHERE l.trade_id = t.id)
             ORDER BY t.entry_time ASC, t.id ASC",
            TRADE_COLUMNS
        );
        let mut stmt = conn.prepare(&query).map_err(query_err)?;
        let rows = stmt.query_map([], trade_from_row).map_err(query_err)?;
        collect_rows(rows)
    }

    fn insert_label(&self, label: &NewLabel) -> Result<i64, BracketeerError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;

        let exists: bool = tx
            .query_row(
                "SELECT EXISTS (SELECT 1 FROM labels WHERE trade_id = ?1)",
                params![label.trade_id],
                |row| row.get(0),
            )
            .map_err(query_err)?;
        if exists {
            return Err(BracketeerError::EligibilityViolation(
                Eligibility::TradeAlreadyLabeled(label.trade_id),
            ));
        }

        let context = label.setup_context.as_ref().map(to_json).transpose()?;
        tx.execute(
            "INSERT INTO labels (trade_id, outcome, win, pnl, mfe_ratio, mae_ratio,
             bars_to_target, bars_to_stop, setup_context)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                label.trade_id,
                label.outcome.as_str(),
                label.win,
                label.pnl,
                label.mfe_ratio,
                label.mae_ratio,
                label.bars_to_target.map(|n| n as i64),
                label.bars_to_stop.map(|n| n as i64),
                context
            ],
        )
        .map_err(query_err)?;
        let id = tx.last_insert_rowid();

        tx.commit().map_err(query_err)?;
        Ok(id)
    }

    fn labels(&self) -> Result<Vec<Label>, BracketeerError> {
        let conn = self.conn()?;
        let query = format!("SELECT {} FROM labels ORDER BY id ASC", LABEL_COLUMNS);
        let mut stmt = conn.prepare(&query).map_err(query_err)?;
        let rows = stmt.query_map([], label_from_row).map_err(query_err)?;
        collect_rows(rows)
    }

    fn purge_window(&self, scope: &Scope, window: &TimeWindow) -> Result<usize, BracketeerError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;

        let ids: Vec<i64> = {
            let mut stmt = tx
                .prepare(
                    "SELECT id, symbol, timeframe FROM candidates
                     WHERE timestamp >= ?1 AND timestamp < ?2",
                )
                .map_err(query_err)?;
            let rows = stmt
                .query_map(
                    params![fmt_ts(&window.start), fmt_ts(&window.end)],
                    |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                        ))
                    },
                )
                .map_err(query_err)?;
            collect_rows(rows)?
                .into_iter()
                .filter(|(_, symbol, timeframe)| scope.includes(symbol, timeframe))
                .map(|(id, _, _)| id)
                .collect()
        };

        for id in &ids {
            tx.execute(
                "DELETE FROM labels WHERE trade_id IN (SELECT id FROM trades WHERE candidate_id = ?1)",
                params![id],
            )
            .map_err(query_err)?;
            tx.execute("DELETE FROM trades WHERE candidate_id = ?1", params![id])
                .map_err(query_err)?;
            tx.execute("DELETE FROM candidates WHERE id = ?1", params![id])
                .map_err(query_err)?;
        }

        tx.commit().map_err(query_err)?;
        Ok(ids.len())
    }
}

impl FilterStorePort for SqliteAdapter {
    fn active_filter(&self) -> Result<Option<FilterHistory>, BracketeerError> {
        let conn = self.conn()?;
        let query = format!(
            "SELECT {} FROM filter_history WHERE active = 1 ORDER BY version DESC LIMIT 1",
            HISTORY_COLUMNS
        );
        conn.query_row(&query, [], history_from_row)
            .optional()
            .map_err(query_err)
    }

    fn promote(
        &self,
        config: &FilterConfig,
        reason: &str,
        metrics: Option<&Metrics>,
    ) -> Result<FilterHistory, BracketeerError> {
        let now = Utc::now().naive_utc();
        let config_json = to_json(config)?;
        let metrics_json = metrics.map(to_json).transpose()?;

        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;

        let version: i64 = tx
            .query_row(
                "SELECT COALESCE(MAX(version), 0) + 1 FROM filter_history",
                [],
                |row| row.get(0),
            )
            .map_err(query_err)?;
        tx.execute(
            "UPDATE filter_history SET active = 0, deactivated_at = ?1 WHERE active = 1",
            params![fmt_ts(&now)],
        )
        .map_err(query_err)?;
        tx.execute(
            "INSERT INTO filter_history (version, config, reason, metrics, active, created_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5)",
            params![version, config_json, reason, metrics_json, fmt_ts(&now)],
        )
        .map_err(query_err)?;
        let id = tx.last_insert_rowid();

        tx.commit().map_err(query_err)?;

        Ok(FilterHistory {
            id,
            version,
            config: config.clone(),
            reason: reason.to_string(),
            metrics: metrics.copied(),
            active: true,
            created_at: NaiveDateTime::parse_from_str(&fmt_ts(&now), TIMESTAMP_FORMAT)
                .unwrap_or(now),
            deactivated_at: None,
        })
    }

    fn filter_history(&self) -> Result<Vec<FilterHistory>, BracketeerError> {
        let conn = self.conn()?;
        let query = format!(
            "SELECT {} FROM filter_history ORDER BY version DESC",
            HISTORY_COLUMNS
        );
        let mut stmt = conn.prepare(&query).map_err(query_err)?;
        let rows = stmt.query_map([], history_from_row).map_err(query_err)?;
        collect_rows(rows)
    }
}

impl ReportPort for SqliteAdapter {
    fn insert_report(&self, report: &NewReport) -> Result<i64, BracketeerError> {
        let conn = self.conn()?;
        let approval = &report.approval;
        conn.execute(
            "INSERT INTO optimization_reports (created_at, train_start, train_end, test_start,
             test_end, symbols, timeframes, old_config, new_config, train_results, test_results,
             accepted, significance, reasoning, approved, approved_by, rejection_reason,
             reviewed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
             ?18)",
            params![
                fmt_ts(&report.created_at),
                fmt_ts(&report.split.train.start),
                fmt_ts(&report.split.train.end),
                fmt_ts(&report.split.test.start),
                fmt_ts(&report.split.test.end),
                to_json(&report.symbols)?,
                to_json(&report.timeframes)?,
                to_json(&report.old_config)?,
                to_json(&report.new_config)?,
                to_json(&report.train)?,
                to_json(&report.test)?,
                report.accepted,
                report.significance,
                report.reasoning,
                approval.approved,
                approval.approved_by.map(|r| r.as_str()),
                approval.rejection_reason,
                approval.reviewed_at.as_ref().map(fmt_ts)
            ],
        )
        .map_err(query_err)?;
        Ok(conn.last_insert_rowid())
    }

    fn report(&self, id: i64) -> Result<Option<OptimizationReport>, BracketeerError> {
        let conn = self.conn()?;
        let query = format!(
            "SELECT {} FROM optimization_reports WHERE id = ?1",
            REPORT_COLUMNS
        );
        conn.query_row(&query, params![id], report_from_row)
            .optional()
            .map_err(query_err)
    }

    fn reports(&self, limit: usize) -> Result<Vec<OptimizationReport>, BracketeerError> {
        let conn = self.conn()?;
        let query = format!(
            "SELECT {} FROM optimization_reports ORDER BY id DESC LIMIT ?1",
            REPORT_COLUMNS
        );
        let mut stmt = conn.prepare(&query).map_err(query_err)?;
        let rows = stmt
            .query_map(params![limit as i64], report_from_row)
            .map_err(query_err)?;
        collect_rows(rows)
    }

    fn record_review(&self, id: i64, approval: &Approval) -> Result<(), BracketeerError> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE optimization_reports
                 SET approved = ?1, approved_by = ?2, rejection_reason = ?3, reviewed_at = ?4
                 WHERE id = ?5",
                params![
                    approval.approved,
                    approval.approved_by.map(|r| r.as_str()),
                    approval.rejection_reason,
                    approval.reviewed_at.as_ref().map(fmt_ts),
                    id
                ],
            )
            .map_err(query_err)?;
        if changed == 0 {
            return Err(BracketeerError::ReportNotFound { id });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::side::{Direction, Side};
    use chrono::NaiveDate;

    struct EmptyConfig;

    impl ConfigPort for EmptyConfig {
        fn get_string(&self, _section: &str, _key: &str) -> Option<String> {
            None
        }
        fn get_int(&self, _section: &str, _key: &str, default: i64) -> i64 {
            default
        }
        fn get_double(&self, _section: &str, _key: &str, default: f64) -> f64 {
            default
        }
        fn get_bool(&self, _section: &str, _key: &str, default: bool) -> bool {
            default
        }
    }

    fn adapter() -> SqliteAdapter {
        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter.initialize_schema().unwrap();
        adapter
    }

    fn ts(minute: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
            + chrono::Duration::minutes(minute)
    }

    fn bar(minute: i64, close: f64) -> Bar {
        Bar {
            id: 0,
            symbol: "ES".into(),
            timeframe: "1m".into(),
            timestamp: ts(minute),
            open: close,
            high: close + 0.5,
            low: close - 0.5,
            close,
            volume: 100.0,
            indicators: IndicatorSnapshot {
                atr: Some(2.0),
                ..IndicatorSnapshot::default()
            },
        }
    }

    fn setup(minute: i64) -> Setup {
        Setup {
            symbol: "ES".into(),
            timeframe: "1m".into(),
            timestamp: ts(minute),
            bar_id: 1,
            signal: Side::Long,
            indicators: IndicatorSnapshot::default(),
            ema_aligned: true,
            volume_surge: false,
            vwap_dev: 0.25,
        }
    }

    fn decision(score: f64) -> Decision {
        Decision {
            score,
            direction: Direction::Long,
            rationale: "test".into(),
        }
    }

    fn new_trade(candidate_id: i64, minute: i64) -> NewTrade {
        NewTrade {
            candidate_id,
            symbol: "ES".into(),
            timeframe: "1m".into(),
            side: Side::Long,
            entry_time: ts(minute),
            entry_price: 100.0,
            exit_time: ts(minute + 3),
            exit_price: 104.0,
            exit_reason: crate::domain::trade::ExitReason::Target,
            stop_price: 98.0,
            target_price: 104.0,
            position_size: 1,
            pnl: 4.0,
            pnl_ticks: 16,
            mfe: 4.5,
            mae: 0.5,
            bars_held: 3,
            filter_config: FilterConfig::default(),
            score: 8.0,
        }
    }

    fn scope() -> Scope {
        Scope::new(vec!["ES".into()], vec!["1m".into()])
    }

    #[test]
    fn from_config_missing_path() {
        match SqliteAdapter::from_config(&EmptyConfig) {
            Err(BracketeerError::ConfigMissing { section, key }) => {
                assert_eq!(section, "sqlite");
                assert_eq!(key, "path");
            }
            other => panic!("expected ConfigMissing, got {:?}", other.err()),
        }
    }

    #[test]
    fn initialize_schema_is_idempotent() {
        let adapter = adapter();
        adapter.initialize_schema().unwrap();
    }

    #[test]
    fn insert_bars_ignores_duplicates() {
        let adapter = adapter();
        assert_eq!(adapter.insert_bars(&[bar(0, 100.0), bar(1, 101.0)]).unwrap(), 2);
        assert_eq!(adapter.insert_bars(&[bar(1, 999.0), bar(2, 102.0)]).unwrap(), 1);

        let bars = adapter.get_bars("ES", "1m", None, None).unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[1].close, 101.0);
        assert_eq!(bars[0].indicators.atr, Some(2.0));
        assert!(bars.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn get_bars_since_and_limit() {
        let adapter = adapter();
        let bars: Vec<Bar> = (0..10).map(|i| bar(i, 100.0 + i as f64)).collect();
        adapter.insert_bars(&bars).unwrap();

        let since = adapter.get_bars("ES", "1m", Some(ts(5)), None).unwrap();
        assert_eq!(since.len(), 5);
        assert_eq!(since[0].timestamp, ts(5));

        let limited = adapter.get_bars("ES", "1m", None, Some(3)).unwrap();
        assert_eq!(limited.len(), 3);

        let after = adapter.bars_after("ES", "1m", ts(5), 2).unwrap();
        assert_eq!(after.len(), 2);
        assert_eq!(after[0].timestamp, ts(6));

        let by_id = adapter.bar_by_id(after[0].id).unwrap().unwrap();
        assert_eq!(by_id.timestamp, ts(6));
        assert!(adapter.bar_by_id(9999).unwrap().is_none());
    }

    #[test]
    fn bars_before_returns_the_tail_ascending() {
        let adapter = adapter();
        let bars: Vec<Bar> = (0..10).map(|i| bar(i, 100.0 + i as f64)).collect();
        adapter.insert_bars(&bars).unwrap();

        let tail = adapter.bars_before("ES", "1m", ts(6), 3).unwrap();
        let stamps: Vec<_> = tail.iter().map(|b| b.timestamp).collect();
        assert_eq!(stamps, vec![ts(3), ts(4), ts(5)]);

        assert_eq!(adapter.bars_before("ES", "1m", ts(2), 10).unwrap().len(), 2);
        assert!(adapter.bars_before("ES", "1m", ts(0), 10).unwrap().is_empty());
        assert!(adapter.bars_before("NQ", "1m", ts(9), 10).unwrap().is_empty());
    }

    #[test]
    fn has_bars_in_is_half_open() {
        let adapter = adapter();
        adapter.insert_bars(&[bar(5, 100.0)]).unwrap();
        assert!(adapter.has_bars_in("ES", "1m", &TimeWindow::new(ts(5), ts(6))).unwrap());
        assert!(!adapter.has_bars_in("ES", "1m", &TimeWindow::new(ts(0), ts(5))).unwrap());
        assert!(!adapter.has_bars_in("NQ", "1m", &TimeWindow::new(ts(0), ts(9))).unwrap());
    }

    #[test]
    fn data_range_reports_bounds() {
        let adapter = adapter();
        assert!(adapter.data_range("ES", "1m").unwrap().is_none());
        adapter.insert_bars(&[bar(0, 1.0), bar(7, 2.0)]).unwrap();
        let (first, last, count) = adapter.data_range("ES", "1m").unwrap().unwrap();
        assert_eq!(first, ts(0));
        assert_eq!(last, ts(7));
        assert_eq!(count, 2);
    }

    #[test]
    fn duplicate_candidate_returns_none() {
        let adapter = adapter();
        let id = adapter.insert_candidate(&setup(0)).unwrap();
        assert!(id.is_some());
        assert_eq!(adapter.insert_candidate(&setup(0)).unwrap(), None);

        let stored = adapter.candidate(id.unwrap()).unwrap().unwrap();
        assert_eq!(stored.setup, setup(0));
        assert!(stored.decision.is_none());
    }

    #[test]
    fn decision_is_written_once() {
        let adapter = adapter();
        let id = adapter.insert_candidate(&setup(0)).unwrap().unwrap();
        adapter.record_decision(id, &decision(8.0)).unwrap();

        match adapter.record_decision(id, &decision(2.0)) {
            Err(BracketeerError::EligibilityViolation(Eligibility::CandidateAlreadyScored(c))) => {
                assert_eq!(c, id)
            }
            other => panic!("expected CandidateAlreadyScored, got {:?}", other),
        }
        let stored = adapter.candidate(id).unwrap().unwrap();
        assert_eq!(stored.decision, Some(decision(8.0)));
        assert!(adapter.unscored_candidates(&scope(), None).unwrap().is_empty());
    }

    #[test]
    fn executable_candidates_respect_threshold_and_trades() {
        let adapter = adapter();
        let low = adapter.insert_candidate(&setup(0)).unwrap().unwrap();
        let high = adapter.insert_candidate(&setup(1)).unwrap().unwrap();
        let traded = adapter.insert_candidate(&setup(2)).unwrap().unwrap();
        let none = adapter.insert_candidate(&setup(3)).unwrap().unwrap();
        adapter.record_decision(low, &decision(6.9)).unwrap();
        adapter.record_decision(high, &decision(7.0)).unwrap();
        adapter.record_decision(traded, &decision(9.0)).unwrap();
        adapter
            .record_decision(
                none,
                &Decision {
                    score: 9.0,
                    direction: Direction::NoTrade,
                    rationale: String::new(),
                },
            )
            .unwrap();
        adapter.insert_trade(&new_trade(traded, 3)).unwrap();

        let scope = scope();
        let query = ExecutionQuery {
            scope: &scope,
            min_score: 7.0,
            window: None,
        };
        let ids: Vec<i64> = adapter
            .executable_candidates(&query)
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![high]);
    }

    #[test]
    fn second_trade_for_candidate_is_rejected() {
        let adapter = adapter();
        let id = adapter.insert_candidate(&setup(0)).unwrap().unwrap();
        adapter.insert_trade(&new_trade(id, 1)).unwrap();
        assert!(matches!(
            adapter.insert_trade(&new_trade(id, 1)),
            Err(BracketeerError::EligibilityViolation(
                Eligibility::CandidateAlreadyTraded(_)
            ))
        ));
    }

    #[test]
    fn trade_round_trips_with_frozen_config() {
        let adapter = adapter();
        let id = adapter.insert_candidate(&setup(0)).unwrap().unwrap();
        let trade = new_trade(id, 1);
        adapter.insert_trade(&trade).unwrap();
        let stored = adapter
            .trades_between(&scope(), &TimeWindow::new(ts(0), ts(60)))
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].record, trade);
    }

    #[test]
    fn labels_are_written_once() {
        let adapter = adapter();
        let id = adapter.insert_candidate(&setup(0)).unwrap().unwrap();
        let trade_id = adapter.insert_trade(&new_trade(id, 1)).unwrap();
        assert_eq!(adapter.unlabeled_trades().unwrap().len(), 1);

        let label = NewLabel {
            trade_id,
            outcome: crate::domain::label::Outcome::Favorable,
            win: true,
            pnl: 4.0,
            mfe_ratio: Some(2.25),
            mae_ratio: None,
            bars_to_target: Some(3),
            bars_to_stop: None,
            setup_context: None,
        };
        adapter.insert_label(&label).unwrap();
        assert!(adapter.unlabeled_trades().unwrap().is_empty());
        assert!(matches!(
            adapter.insert_label(&label),
            Err(BracketeerError::EligibilityViolation(
                Eligibility::TradeAlreadyLabeled(_)
            ))
        ));
        assert_eq!(adapter.labels().unwrap()[0].record, label);
    }

    #[test]
    fn purge_window_removes_candidates_trades_and_labels() {
        let adapter = adapter();
        let inside = adapter.insert_candidate(&setup(10)).unwrap().unwrap();
        let outside = adapter.insert_candidate(&setup(40)).unwrap().unwrap();
        let trade_id = adapter.insert_trade(&new_trade(inside, 11)).unwrap();
        adapter.insert_trade(&new_trade(outside, 41)).unwrap();
        adapter
            .insert_label(&NewLabel {
                trade_id,
                outcome: crate::domain::label::Outcome::Favorable,
                win: true,
                pnl: 4.0,
                mfe_ratio: None,
                mae_ratio: None,
                bars_to_target: Some(3),
                bars_to_stop: None,
                setup_context: None,
            })
            .unwrap();

        let other_scope = Scope::new(vec!["NQ".into()], vec!["1m".into()]);
        assert_eq!(
            adapter.purge_window(&other_scope, &TimeWindow::new(ts(0), ts(30))).unwrap(),
            0
        );

        let purged = adapter.purge_window(&scope(), &TimeWindow::new(ts(0), ts(30))).unwrap();
        assert_eq!(purged, 1);
        assert!(adapter.candidate(inside).unwrap().is_none());
        assert!(adapter.candidate(outside).unwrap().is_some());
        assert!(adapter.labels().unwrap().is_empty());
        let remaining = adapter
            .trades_between(&scope(), &TimeWindow::new(ts(0), ts(120)))
            .unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].record.candidate_id, outside);
    }

    #[test]
    fn promote_keeps_a_single_active_entry() {
        let adapter = adapter();
        assert!(adapter.active_filter().unwrap().is_none());
        assert_eq!(
            adapter.active_config(&FilterConfig::default()).unwrap(),
            FilterConfig::default()
        );

        let first = adapter.promote(&FilterConfig::default(), "seed", None).unwrap();
        let tuned = FilterConfig {
            rsi14_buy: 35.0,
            ..FilterConfig::default()
        };
        let metrics = Metrics {
            count: 30,
            win_rate: 0.6,
            ..Metrics::default()
        };
        let second = adapter.promote(&tuned, "tuned", Some(&metrics)).unwrap();
        assert_eq!(first.version, 1);
        assert_eq!(second.version, 2);

        let history = adapter.filter_history().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.iter().filter(|h| h.active).count(), 1);
        assert!(history[1].deactivated_at.is_some());
        assert_eq!(history[0].metrics, Some(metrics));
        assert_eq!(adapter.active_config(&FilterConfig::default()).unwrap(), tuned);
    }

    #[test]
    fn report_review_updates_only_approval() {
        use crate::domain::report::{Comparison, Reviewer};

        let adapter = adapter();
        let report = NewReport {
            created_at: ts(0),
            split: Split::ending_at(ts(0), 21, 7),
            symbols: vec!["ES".into()],
            timeframes: vec!["1m".into()],
            old_config: FilterConfig::default(),
            new_config: FilterConfig {
                ema_fast: 11,
                ..FilterConfig::default()
            },
            train: Comparison::default(),
            test: Comparison::default(),
            accepted: true,
            significance: 0.9,
            reasoning: "better".into(),
            approval: Approval::pending(),
        };
        let id = adapter.insert_report(&report).unwrap();
        let stored = adapter.report(id).unwrap().unwrap();
        assert_eq!(stored.record, report);

        let approval = Approval {
            approved: Some(true),
            approved_by: Some(Reviewer::Human),
            rejection_reason: None,
            reviewed_at: Some(ts(5)),
        };
        adapter.record_review(id, &approval).unwrap();
        let reviewed = adapter.report(id).unwrap().unwrap();
        assert_eq!(reviewed.record.approval, approval);
        assert_eq!(reviewed.record.new_config, report.new_config);

        assert!(matches!(
            adapter.record_review(id + 1, &approval),
            Err(BracketeerError::ReportNotFound { .. })
        ));
        assert_eq!(adapter.reports(10).unwrap().len(), 1);
    }
}
