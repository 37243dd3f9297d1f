//! CLI definition and dispatch.

use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::command_scorer::CommandScorer;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::memory_adapter::MemoryJournal;
use crate::adapters::rule_scorer::RuleScorer;
use crate::adapters::sqlite_adapter::SqliteAdapter;
use crate::domain::backtest::{BacktestConfig, BacktestResult, run_backtest};
use crate::domain::bar::TIMESTAMP_FORMAT;
use crate::domain::config_validation::{
    MAX_WINDOW_DAYS, check_range, execution_settings, optimizer_settings, seed_filter_config,
    universe, validate_all,
};
use crate::domain::error::BracketeerError;
use crate::domain::evaluation::WindowEvaluator;
use crate::domain::execution::ExecutionSettings;
use crate::domain::filter_config::FilterConfig;
use crate::domain::indicator::enrich_after;
use crate::domain::metrics::Metrics;
use crate::domain::pipeline::Pipeline;
use crate::domain::report::OptimizationReport;
use crate::domain::scope::{Scope, parse_list};
use crate::domain::walk_forward::{Optimizer, OptimizerSettings, review};
use crate::ports::candle_port::CandlePort;
use crate::ports::config_port::ConfigPort;
use crate::ports::decision_port::DecisionPort;
use crate::ports::filter_store_port::FilterStorePort;
use crate::ports::journal_port::JournalPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "bracketeer",
    about = "Triple-RSI setup detection, bracket simulation and walk-forward filter tuning"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Overrides for the `[universe]` section.
#[derive(Args, Debug, Clone, Default)]
pub struct Selection {
    /// Comma-separated symbols
    #[arg(long)]
    pub symbols: Option<String>,
    /// Comma-separated timeframes
    #[arg(long)]
    pub timeframes: Option<String>,
}

/// Overrides for the `[optimizer]` window lengths.
#[derive(Args, Debug, Clone, Default)]
pub struct Windows {
    /// Training window length in days
    #[arg(long)]
    pub train_days: Option<i64>,
    /// Test window length in days
    #[arg(long)]
    pub test_days: Option<i64>,
}

impl Windows {
    pub fn apply(&self, settings: &mut OptimizerSettings) -> Result<(), BracketeerError> {
        if let Some(days) = self.train_days {
            settings.train_days = check_range("arguments", "train_days", days, 1, MAX_WINDOW_DAYS)?;
        }
        if let Some(days) = self.test_days {
            settings.test_days = check_range("arguments", "test_days", days, 1, MAX_WINDOW_DAYS)?;
        }
        Ok(())
    }
}

/// Most folds one backtest may replay.
pub const MAX_BACKTEST_STEPS: i64 = 520;

/// Stored bars carried into the indicators of an import that continues a series.
pub const IMPORT_CONTEXT_BARS: usize = 1_500;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Import bars from a CSV file
    Import {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        file: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        timeframe: String,
    },
    /// Detect candidates under the active filter configuration
    Detect {
        #[arg(short, long)]
        config: PathBuf,
        #[command(flatten)]
        selection: Selection,
    },
    /// Score unscored candidates
    Score {
        #[arg(short, long)]
        config: PathBuf,
        #[command(flatten)]
        selection: Selection,
    },
    /// Simulate eligible candidates into trades
    Execute {
        #[arg(short, long)]
        config: PathBuf,
        #[command(flatten)]
        selection: Selection,
    },
    /// Label unlabeled trades
    Label {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Detect, score, execute and label in one pass
    Run {
        #[arg(short, long)]
        config: PathBuf,
        #[command(flatten)]
        selection: Selection,
    },
    /// Run one walk-forward optimization
    Optimize {
        #[arg(short, long)]
        config: PathBuf,
        #[command(flatten)]
        selection: Selection,
        #[command(flatten)]
        windows: Windows,
        /// End of the test window (defaults to just after the latest bar)
        #[arg(long)]
        as_of: Option<String>,
        /// Promote the candidate configuration if it is accepted
        #[arg(long)]
        auto_approve: bool,
    },
    /// Approve or reject an optimization report
    Review {
        #[arg(short, long)]
        config: PathBuf,
        id: i64,
        #[arg(long, conflicts_with = "reject", required_unless_present = "reject")]
        approve: bool,
        #[arg(long)]
        reject: bool,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Rolling walk-forward backtest of the active or a supplied configuration
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[command(flatten)]
        selection: Selection,
        #[command(flatten)]
        windows: Windows,
        #[arg(long, default_value_t = 4)]
        steps: usize,
        /// End of the last fold (defaults to just after the latest bar)
        #[arg(long)]
        end: Option<String>,
        /// JSON object overlaid on the active configuration, or a report id
        /// whose candidate configuration is backtested
        #[arg(long)]
        filters: Option<String>,
        /// Also backtest the active configuration and print the differences
        #[arg(long, requires = "filters")]
        compare: bool,
    },
    /// Show one optimization report, or list recent ones
    ShowReport {
        #[arg(short, long)]
        config: PathBuf,
        id: Option<i64>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// List the filter configuration history
    Filters {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the stored bar range per symbol and timeframe
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[command(flatten)]
        selection: Selection,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Import {
            config,
            file,
            symbol,
            timeframe,
        } => run_import(&config, file, &symbol, &timeframe),
        Command::Detect { config, selection } => run_detect(&config, &selection),
        Command::Score { config, selection } => run_score(&config, &selection),
        Command::Execute { config, selection } => run_execute(&config, &selection),
        Command::Label { config } => run_label(&config),
        Command::Run { config, selection } => run_pipeline(&config, &selection),
        Command::Optimize {
            config,
            selection,
            windows,
            as_of,
            auto_approve,
        } => run_optimize(&config, &selection, &windows, as_of.as_deref(), auto_approve),
        Command::Review {
            config,
            id,
            approve,
            reject: _,
            reason,
        } => run_review(&config, id, approve, reason.as_deref()),
        Command::Backtest {
            config,
            selection,
            windows,
            steps,
            end,
            filters,
            compare,
        } => run_backtest_command(
            &config,
            &selection,
            &windows,
            BacktestRequest {
                steps,
                end,
                filters,
                compare,
            },
        ),
        Command::ShowReport { config, id, limit } => run_show_report(&config, id, limit),
        Command::Filters { config } => run_filters(&config),
        Command::Info { config, selection } => run_info(&config, &selection),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Everything a command needs, built from a validated config file.
pub struct Context {
    pub config: FileConfigAdapter,
    pub store: SqliteAdapter,
    pub scope: Scope,
    pub execution: ExecutionSettings,
    pub seed: FilterConfig,
    pub optimizer: OptimizerSettings,
}

impl Context {
    pub fn open(config_path: &PathBuf, selection: &Selection) -> Result<Self, BracketeerError> {
        eprintln!("Loading config from {}", config_path.display());
        let config = FileConfigAdapter::from_file(config_path)?;
        validate_all(&config)?;

        let store = SqliteAdapter::from_config(&config)?;
        store.initialize_schema()?;

        let configured = universe(&config)?;
        let scope = Scope::new(
            selection
                .symbols
                .as_deref()
                .map(|raw| parse_list(&raw.to_uppercase()))
                .filter(|s| !s.is_empty())
                .unwrap_or(configured.symbols),
            selection
                .timeframes
                .as_deref()
                .map(parse_list)
                .filter(|t| !t.is_empty())
                .unwrap_or(configured.timeframes),
        );

        Ok(Context {
            execution: execution_settings(&config)?,
            seed: seed_filter_config(&config)?,
            optimizer: optimizer_settings(&config)?,
            config,
            store,
            scope,
        })
    }

    /// The configuration in force: the active history entry, else the seed.
    pub fn active_config(&self) -> Result<FilterConfig, BracketeerError> {
        self.store.active_config(&self.seed)
    }

    /// Latest bar across the scope, plus one second so that it falls inside
    /// a half-open window ending there.
    fn data_end(&self) -> Result<NaiveDateTime, BracketeerError> {
        let mut last: Option<NaiveDateTime> = None;
        for (symbol, timeframe) in self.scope.pairs() {
            if let Some((_, end, _)) = self.store.data_range(symbol, timeframe)? {
                last = Some(last.map_or(end, |l| l.max(end)));
            }
        }
        Ok(last
            .map(|l| l + Duration::seconds(1))
            .unwrap_or_else(|| Utc::now().naive_utc()))
    }
}

pub fn build_scorer(config: &dyn ConfigPort) -> Result<Box<dyn DecisionPort>, BracketeerError> {
    let kind = config
        .get_string("scorer", "kind")
        .unwrap_or_else(|| "rule".into());
    match kind.trim() {
        "command" => {
            let line = config.get_string("scorer", "command").unwrap_or_default();
            let scorer = CommandScorer::from_command_line(&line).ok_or_else(|| {
                BracketeerError::ConfigMissing {
                    section: "scorer".into(),
                    key: "command".into(),
                }
            })?;
            Ok(Box::new(scorer))
        }
        _ => Ok(Box::new(RuleScorer)),
    }
}

/// Resolve a `--filters` argument against `base`, the active configuration.
///
/// A bare integer names an optimization report and yields its candidate
/// configuration. Anything else must be a JSON object whose fields replace
/// the matching fields of `base`.
pub fn resolve_filters(
    reports: &dyn ReportPort,
    base: &FilterConfig,
    raw: &str,
) -> Result<FilterConfig, BracketeerError> {
    let raw = raw.trim();
    if let Ok(id) = raw.parse::<i64>() {
        let report = reports.report(id)?.ok_or(BracketeerError::ReportNotFound { id })?;
        return Ok(report.record.new_config);
    }

    let invalid = |reason: String| BracketeerError::ConfigInvalid {
        section: "arguments".into(),
        key: "filters".into(),
        reason,
    };
    let overrides = match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Object(map)) => map,
        Ok(_) => return Err(invalid("expected a JSON object or a report id".into())),
        Err(e) => return Err(invalid(format!("invalid JSON: {}", e))),
    };

    let mut merged = serde_json::to_value(base)?;
    if let serde_json::Value::Object(fields) = &mut merged {
        for (key, value) in overrides {
            if !fields.contains_key(&key) {
                return Err(invalid(format!("unknown filter field '{}'", key)));
            }
            fields.insert(key, value);
        }
    }
    let config: FilterConfig =
        serde_json::from_value(merged).map_err(|e| invalid(format!("invalid filter value: {}", e)))?;
    config.validate()?;
    Ok(config)
}

/// `YYYY-MM-DD` (midnight) or `YYYY-MM-DD HH:MM:SS`.
pub fn parse_instant(key: &str, raw: &str) -> Result<NaiveDateTime, BracketeerError> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| BracketeerError::ConfigInvalid {
            section: "arguments".into(),
            key: key.into(),
            reason: format!("invalid timestamp '{}' (expected YYYY-MM-DD [HH:MM:SS])", raw),
        })
}

fn run_import(
    config_path: &PathBuf,
    file: PathBuf,
    symbol: &str,
    timeframe: &str,
) -> Result<(), BracketeerError> {
    let ctx = Context::open(config_path, &Selection::default())?;
    let active = ctx.active_config()?;
    let symbol = symbol.to_uppercase();

    let csv = CsvAdapter::new(file);
    eprintln!("Reading {}", csv.path().display());
    let bars = csv.load_bars(&symbol, timeframe)?;
    let history = match bars.first() {
        Some(first) => ctx
            .store
            .bars_before(&symbol, timeframe, first.timestamp, IMPORT_CONTEXT_BARS)?,
        None => Vec::new(),
    };
    if !history.is_empty() {
        eprintln!("Continuing indicators from {} stored bars", history.len());
    }
    let bars = enrich_after(&history, bars, active.ema_fast, active.ema_slow);
    let inserted = ctx.store.insert_bars(&bars)?;

    println!(
        "{} {}: {} bars read, {} inserted, {} already stored",
        symbol,
        timeframe,
        bars.len(),
        inserted,
        bars.len() - inserted
    );
    Ok(())
}

fn run_detect(config_path: &PathBuf, selection: &Selection) -> Result<(), BracketeerError> {
    let ctx = Context::open(config_path, selection)?;
    let scorer = build_scorer(&ctx.config)?;
    let pipeline = Pipeline::new(&ctx.store, &ctx.store, scorer.as_ref(), &ctx.execution);
    let active = ctx.active_config()?;

    for (symbol, timeframe) in ctx.scope.pairs() {
        let summary = pipeline.detect(symbol, timeframe, &active, None)?;
        println!("{} {}: {}", symbol, timeframe, summary);
    }
    Ok(())
}

fn run_score(config_path: &PathBuf, selection: &Selection) -> Result<(), BracketeerError> {
    let ctx = Context::open(config_path, selection)?;
    let scorer = build_scorer(&ctx.config)?;
    let pipeline = Pipeline::new(&ctx.store, &ctx.store, scorer.as_ref(), &ctx.execution);

    let summary = pipeline.score(&ctx.scope, None)?;
    println!("score: {}", summary);
    Ok(())
}

fn run_execute(config_path: &PathBuf, selection: &Selection) -> Result<(), BracketeerError> {
    let ctx = Context::open(config_path, selection)?;
    let scorer = build_scorer(&ctx.config)?;
    let pipeline = Pipeline::new(&ctx.store, &ctx.store, scorer.as_ref(), &ctx.execution);
    let active = ctx.active_config()?;

    let summary = pipeline.execute(&ctx.scope, &active, None)?;
    println!("execute: {}", summary);
    Ok(())
}

fn run_label(config_path: &PathBuf) -> Result<(), BracketeerError> {
    let ctx = Context::open(config_path, &Selection::default())?;
    let scorer = build_scorer(&ctx.config)?;
    let pipeline = Pipeline::new(&ctx.store, &ctx.store, scorer.as_ref(), &ctx.execution);

    let summary = pipeline.label()?;
    println!("label: {}", summary);
    Ok(())
}

fn run_pipeline(config_path: &PathBuf, selection: &Selection) -> Result<(), BracketeerError> {
    let ctx = Context::open(config_path, selection)?;
    let scorer = build_scorer(&ctx.config)?;
    let pipeline = Pipeline::new(&ctx.store, &ctx.store, scorer.as_ref(), &ctx.execution);
    let active = ctx.active_config()?;

    let summary = pipeline.run(&ctx.scope, &active)?;
    println!("detect:  {}", summary.detected);
    println!("score:   {}", summary.scored);
    println!("execute: {}", summary.executed);
    println!("label:   {}", summary.labeled);
    Ok(())
}

/// The journal window re-evaluation writes to: a scratch one when isolated.
fn evaluation_journal<'a>(
    ctx: &'a Context,
    scratch: &'a MemoryJournal,
) -> &'a dyn JournalPort {
    if ctx.optimizer.isolated {
        scratch
    } else {
        &ctx.store
    }
}

fn run_optimize(
    config_path: &PathBuf,
    selection: &Selection,
    windows: &Windows,
    as_of: Option<&str>,
    auto_approve: bool,
) -> Result<(), BracketeerError> {
    let mut ctx = Context::open(config_path, selection)?;
    windows.apply(&mut ctx.optimizer)?;
    let scorer = build_scorer(&ctx.config)?;
    let as_of = match as_of {
        Some(raw) => parse_instant("as_of", raw)?,
        None => ctx.data_end()?,
    };

    let scratch = MemoryJournal::new();
    let journal = evaluation_journal(&ctx, &scratch);
    let pipeline = Pipeline::new(&ctx.store, journal, scorer.as_ref(), &ctx.execution);
    let evaluator = WindowEvaluator::new(pipeline, &ctx.scope);
    let optimizer = Optimizer {
        evaluator: &evaluator,
        filters: &ctx.store,
        reports: &ctx.store,
        settings: &ctx.optimizer,
    };

    eprintln!(
        "Optimizing {} for the {} days ending {}",
        ctx.scope.symbols.join(","),
        ctx.optimizer.train_days + ctx.optimizer.test_days,
        as_of.format(TIMESTAMP_FORMAT)
    );
    let outcome = optimizer.optimize(&ctx.seed, as_of, auto_approve)?;

    let report = OptimizationReport {
        id: outcome.report_id,
        record: outcome.report,
    };
    print_report(&report);
    if let Some(version) = outcome.promoted_version {
        println!("promoted as filter version {}", version);
    }
    Ok(())
}

fn run_review(
    config_path: &PathBuf,
    id: i64,
    approve: bool,
    reason: Option<&str>,
) -> Result<(), BracketeerError> {
    let ctx = Context::open(config_path, &Selection::default())?;
    let report = review(&ctx.store, &ctx.store, id, approve, reason)?;
    println!("report #{} {}", report.id, report.status());
    if approve {
        if let Some(active) = ctx.store.active_filter()? {
            println!("active filter version {}", active.version);
        }
    }
    Ok(())
}

/// What `backtest` should replay.
#[derive(Debug, Clone, Default)]
pub struct BacktestRequest {
    pub steps: usize,
    /// End of the last fold; defaults to just after the latest bar.
    pub end: Option<String>,
    /// A `--filters` argument, see [`resolve_filters`].
    pub filters: Option<String>,
    /// Also replay the active configuration.
    pub compare: bool,
}

#[derive(Debug, Clone)]
pub struct BacktestRun {
    pub config: FilterConfig,
    pub result: BacktestResult,
}

#[derive(Debug, Clone)]
pub struct BacktestOutcome {
    /// The supplied configuration, or the active one when none was given.
    pub primary: BacktestRun,
    /// The active configuration, when compared against a supplied one.
    pub baseline: Option<BacktestRun>,
}

impl BacktestOutcome {
    /// Test win rate and total test P&L of `primary` minus those of `baseline`.
    pub fn deltas(&self) -> Option<(f64, f64)> {
        self.baseline.as_ref().map(|baseline| {
            (
                self.primary.result.avg_test_win_rate - baseline.result.avg_test_win_rate,
                self.primary.result.total_test_pnl - baseline.result.total_test_pnl,
            )
        })
    }
}

/// Rolling backtest over the context's scope and `[optimizer]` windows.
///
/// The active configuration runs against the journal the optimizer would
/// use. A supplied configuration always runs against a scratch journal, so
/// the stored trades stay settled under the active configuration.
pub fn backtest(ctx: &Context, request: &BacktestRequest) -> Result<BacktestOutcome, BracketeerError> {
    let steps = i64::try_from(request.steps).unwrap_or(i64::MAX);
    check_range("arguments", "steps", steps, 1, MAX_BACKTEST_STEPS)?;
    let boxed = build_scorer(&ctx.config)?;
    let end = match request.end.as_deref() {
        Some(raw) => parse_instant("end", raw)?,
        None => ctx.data_end()?,
    };
    let active = ctx.active_config()?;
    let supplied = match request.filters.as_deref() {
        Some(raw) => Some(resolve_filters(&ctx.store, &active, raw)?),
        None => None,
    };

    let config = BacktestConfig {
        train_days: ctx.optimizer.train_days,
        test_days: ctx.optimizer.test_days,
        steps: request.steps,
        end,
    };
    let scorer = boxed.as_ref();

    let scratch = MemoryJournal::new();
    match supplied {
        None => Ok(BacktestOutcome {
            primary: replay(ctx, scorer, evaluation_journal(ctx, &scratch), active, &config)?,
            baseline: None,
        }),
        Some(candidate) => {
            let baseline = if request.compare {
                Some(replay(ctx, scorer, evaluation_journal(ctx, &scratch), active, &config)?)
            } else {
                None
            };
            let candidate_journal = MemoryJournal::new();
            Ok(BacktestOutcome {
                primary: replay(ctx, scorer, &candidate_journal, candidate, &config)?,
                baseline,
            })
        }
    }
}

fn replay(
    ctx: &Context,
    scorer: &dyn DecisionPort,
    journal: &dyn JournalPort,
    filter_config: FilterConfig,
    config: &BacktestConfig,
) -> Result<BacktestRun, BracketeerError> {
    let pipeline = Pipeline::new(&ctx.store, journal, scorer, &ctx.execution);
    let evaluator = WindowEvaluator::new(pipeline, &ctx.scope);
    let result = run_backtest(&evaluator, &ctx.store, &filter_config, config)?;
    Ok(BacktestRun {
        config: filter_config,
        result,
    })
}

fn run_backtest_command(
    config_path: &PathBuf,
    selection: &Selection,
    windows: &Windows,
    request: BacktestRequest,
) -> Result<(), BracketeerError> {
    let mut ctx = Context::open(config_path, selection)?;
    windows.apply(&mut ctx.optimizer)?;
    let outcome = backtest(&ctx, &request)?;

    match &outcome.baseline {
        Some(baseline) => {
            println!("=== Walk-Forward Backtest: active (A) ===");
            print_backtest(baseline);
            println!("=== Walk-Forward Backtest: supplied (B) ===");
            print_backtest(&outcome.primary);
        }
        None => {
            println!("=== Walk-Forward Backtest ===");
            if request.filters.is_some() {
                println!("{}", serde_json::to_string(&outcome.primary.config)?);
            }
            print_backtest(&outcome.primary);
        }
    }
    if let Some((win_rate, pnl)) = outcome.deltas() {
        println!("=== B - A ===");
        println!("test win rate delta: {:+.1} pts", win_rate * 100.0);
        println!("test pnl delta:      {:+.2}", pnl);
    }
    Ok(())
}

fn print_backtest(run: &BacktestRun) {
    let result = &run.result;
    for (i, fold) in result.folds.iter().enumerate() {
        println!("fold {} {}", i + 1, fold.split.span());
        print_metrics("  train", &fold.train);
        print_metrics("  test ", &fold.test);
    }
    println!("folds run:          {}", result.folds.len());
    println!("folds skipped:      {}", result.skipped);
    println!("avg train win rate: {:.1}%", result.avg_train_win_rate * 100.0);
    println!("avg test win rate:  {:.1}%", result.avg_test_win_rate * 100.0);
    println!("total test pnl:     {:.2}", result.total_test_pnl);
}

fn run_show_report(
    config_path: &PathBuf,
    id: Option<i64>,
    limit: usize,
) -> Result<(), BracketeerError> {
    let ctx = Context::open(config_path, &Selection::default())?;

    match id {
        Some(id) => {
            let report = ctx
                .store
                .report(id)?
                .ok_or(BracketeerError::ReportNotFound { id })?;
            print_report(&report);
        }
        None => {
            let reports = ctx.store.reports(limit)?;
            if reports.is_empty() {
                eprintln!("No optimization reports");
            }
            for report in &reports {
                println!(
                    "#{:<4} {}  {:<8} accepted={} test {}",
                    report.id,
                    report.record.created_at.format(TIMESTAMP_FORMAT),
                    report.status(),
                    report.record.accepted,
                    report.record.split.test
                );
            }
        }
    }
    Ok(())
}

fn run_filters(config_path: &PathBuf) -> Result<(), BracketeerError> {
    let ctx = Context::open(config_path, &Selection::default())?;
    let history = ctx.store.filter_history()?;

    if history.is_empty() {
        println!("no promoted configuration; using the [filters] seed");
        println!("{}", serde_json::to_string_pretty(&ctx.seed)?);
        return Ok(());
    }

    for entry in &history {
        println!(
            "v{:<3} {} {}  {}",
            entry.version,
            if entry.active { "*" } else { " " },
            entry.created_at.format(TIMESTAMP_FORMAT),
            entry.reason
        );
        if let Some(metrics) = &entry.metrics {
            print_metrics("     ", metrics);
        }
    }
    if let Some(active) = history.iter().find(|h| h.active) {
        println!("{}", serde_json::to_string_pretty(&active.config)?);
    }
    Ok(())
}

fn run_info(config_path: &PathBuf, selection: &Selection) -> Result<(), BracketeerError> {
    let ctx = Context::open(config_path, selection)?;

    for (symbol, timeframe) in ctx.scope.pairs() {
        match ctx.store.data_range(symbol, timeframe)? {
            Some((first, last, count)) => println!(
                "{} {}: {} bars, {} to {}",
                symbol,
                timeframe,
                count,
                first.format(TIMESTAMP_FORMAT),
                last.format(TIMESTAMP_FORMAT)
            ),
            None => eprintln!("{} {}: no data found", symbol, timeframe),
        }
    }
    Ok(())
}

fn print_metrics(prefix: &str, m: &Metrics) {
    println!(
        "{} trades {:>4}  win {:>5.1}%  pnl {:>9.2}  ratio {:>6.2}  dd {:>8.2}",
        prefix,
        m.count,
        m.win_rate * 100.0,
        m.total_pnl,
        m.return_ratio,
        m.max_drawdown
    );
}

fn print_report(report: &OptimizationReport) {
    let r = &report.record;
    println!("=== Optimization Report #{} ===", report.id);
    println!("created:      {}", r.created_at.format(TIMESTAMP_FORMAT));
    println!("universe:     {} / {}", r.symbols.join(","), r.timeframes.join(","));
    println!("train window: {}", r.split.train);
    println!("test window:  {}", r.split.test);
    print_metrics("train old ", &r.train.baseline);
    print_metrics("train new ", &r.train.candidate);
    print_metrics("test old  ", &r.test.baseline);
    print_metrics("test new  ", &r.test.candidate);
    println!("accepted:     {} (significance {:.2})", r.accepted, r.significance);
    println!("status:       {}", report.status());
    if let Some(by) = r.approval.approved_by {
        println!("reviewed by:  {}", by);
    }
    if let Some(reason) = &r.approval.rejection_reason {
        println!("rejection:    {}", reason);
    }
    println!("reasoning:    {}", r.reasoning);
    if r.old_config != r.new_config {
        match serde_json::to_string(&r.new_config) {
            Ok(json) => println!("new config:   {}", json),
            Err(e) => eprintln!("warning: could not render config: {e}"),
        }
    }
}
