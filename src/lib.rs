//! Performance metrics for the trading journal.
//!
//! Trades arrive as JSON rows from the hosted backend and are turned into
//! dashboard statistics, daily/weekly calendar buckets and equity curves.
//! The `metrics` module holds the pure aggregation functions; `commands`
//! is the entry point used by the app screens.

pub mod commands;
pub mod error;
pub mod metrics;
pub mod models;

pub use error::{MetricsError, Result};
