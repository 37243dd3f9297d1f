//! Core domain types and logic.

pub mod backtest;
pub mod bar;
pub mod candidate;
pub mod config_validation;
pub mod detector;
pub mod error;
pub mod evaluation;
pub mod execution;
pub mod filter_config;
pub mod filter_history;
pub mod indicator;
pub mod label;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod scope;
pub mod side;
pub mod simulator;
pub mod summary;
pub mod trade;
pub mod walk_forward;
pub mod window;
