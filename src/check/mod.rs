//! Redirect checking: header fetch, chain resolution, validity and batching.
//!
//! - [`HeaderFetcher`] issues one GET without following redirects, retrying
//!   transient transport failures with exponential backoff.
//! - [`RedirectResolver`] follows a chain hop by hop up to a hop limit.
//! - [`ValidityPolicy`] decides whether a finished chain is a correct
//!   single permanent redirect onto the expected destination.
//! - [`BatchScheduler`] runs many pairs in delayed, concurrent chunks.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use redirect_checker::check::{HeaderFetcher, RedirectResolver, RetryPolicy, ValidityPolicy};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = HeaderFetcher::new(Duration::from_secs(10), RetryPolicy::default())?;
//! let resolver = RedirectResolver::new(fetcher, ValidityPolicy::default());
//! let outcome = resolver
//!     .resolve("http://example.com/old", "https://example.com/new")
//!     .await?;
//! println!("valid: {} after {} hop(s)", outcome.is_valid, outcome.hop_count);
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod error;
mod outcome;
mod policy;
mod resolver;
mod retry;
mod scheduler;

pub use client::{HeaderFetcher, HopTransport, ReqwestTransport, parse_check_url};
pub use constants::{
    DEFAULT_CHUNK_DELAY, DEFAULT_CHUNK_SIZE, DEFAULT_INITIAL_BACKOFF, DEFAULT_MAX_REDIRECTIONS,
    DEFAULT_MAX_RETRIES, DEFAULT_PERMANENT_REDIRECT_CODES, DEFAULT_REQUEST_TIMEOUT,
};
pub use error::{CheckError, TransportError};
pub use outcome::{HopResult, RedirectHop, ResolutionOutcome};
pub use policy::{ValidityPolicy, Verdict, Violation};
pub use resolver::RedirectResolver;
pub use retry::{FailureType, RetryDecision, RetryPolicy, classify_error};
pub use scheduler::{BatchScheduler, ProgressEvent, SchedulerError};
