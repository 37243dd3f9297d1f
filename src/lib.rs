//! bracketeer: triple-RSI setup detection, bracket-order simulation and
//! walk-forward filter tuning for index futures.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
#[cfg(feature = "sqlite")]
pub mod cli;
