//! Redirect Checker Core Library
//!
//! Verifies that legacy URLs redirect to their intended new locations with a
//! single permanent redirect, as needed when auditing a site migration.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`parser`] - Delimited input file reading into (source, destination) pairs
//! - [`check`] - Header fetcher, redirect resolver, validity policy and batch scheduler
//! - [`report`] - Aggregated results and the JSON report writer
//! - [`config`] - Layered configuration (defaults, TOML file, environment, CLI)

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod check;
pub mod config;
pub mod parser;
pub mod report;
pub(crate) mod user_agent;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use check::{
    BatchScheduler, CheckError, HeaderFetcher, RedirectResolver, ResolutionOutcome, RetryPolicy,
    ValidityPolicy,
};
pub use config::{CheckerConfig, ConfigError};
pub use parser::{InputError, ParseResult, RedirectPair, read_pairs};
pub use report::{Report, Summary, write_report};
