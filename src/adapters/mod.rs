//! Concrete implementations of the ports.

pub mod command_scorer;
pub mod csv_adapter;
pub mod file_config_adapter;
pub mod memory_adapter;
pub mod rule_scorer;
#[cfg(feature = "sqlite")]
pub mod sqlite_adapter;
