//! Port traits the domain depends on.

pub mod candle_port;
pub mod config_port;
pub mod decision_port;
pub mod filter_store_port;
pub mod journal_port;
pub mod report_port;
