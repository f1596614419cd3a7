//! Retry logic with exponential backoff for transient fetch failures.
//!
//! A failed request attempt is classified into a [`FailureType`]:
//! - [`FailureType::Transient`] - connection refused/reset/aborted, resource
//!   exhaustion, timeouts; may succeed on retry
//! - [`FailureType::Permanent`] - TLS failures, malformed responses and everything
//!   else; retrying would not help
//!
//! The [`RetryPolicy`] then decides whether to retry and how long to wait.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use redirect_checker::check::{FailureType, RetryDecision, RetryPolicy};
//!
//! let policy = RetryPolicy::new(3, Duration::from_millis(1000));
//!
//! match policy.should_retry(FailureType::Transient, 0) {
//!     RetryDecision::Retry { delay, retry } => {
//!         assert_eq!(delay, Duration::from_millis(1000));
//!         assert_eq!(retry, 1);
//!     }
//!     RetryDecision::DoNotRetry { reason } => panic!("unexpected: {reason}"),
//! }
//! ```

use std::error::Error as _;
use std::io::ErrorKind;
use std::time::Duration;

use tracing::{debug, instrument};

use super::constants::{DEFAULT_INITIAL_BACKOFF, DEFAULT_MAX_RETRIES};
use super::error::TransportError;

/// Backoff multiplier (doubles each retry).
const BACKOFF_MULTIPLIER: u32 = 2;

/// Classification of a failed request attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Temporary failure that may succeed on retry.
    ///
    /// Examples: connection reset, too many open files, timeout.
    Transient,

    /// Failure that won't succeed regardless of retries.
    ///
    /// Examples: TLS certificate errors, malformed responses.
    Permanent,
}

/// Decision on whether to retry a failed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the request after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which retry this will be (1-indexed, so the first retry is 1).
        retry: u32,
    },

    /// Do not retry the request.
    DoNotRetry {
        /// Human-readable reason why retry is not attempted.
        reason: String,
    },
}

/// Retry budget and backoff schedule.
///
/// # Delay Calculation
///
/// ```text
/// delay = initial_backoff * 2^retries_so_far
/// ```
///
/// With defaults, delays are 1s, 2s, 4s before the budget of 3 retries is spent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt.
    max_retries: u32,

    /// Delay before the first retry.
    initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Creates a retry policy.
    ///
    /// # Arguments
    ///
    /// * `max_retries` - Retries allowed after the initial attempt (0 disables retrying)
    /// * `initial_backoff` - Delay before the first retry
    #[must_use]
    pub fn new(max_retries: u32, initial_backoff: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff,
        }
    }

    /// Returns the maximum number of retries configured.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the delay before the first retry.
    #[must_use]
    pub fn initial_backoff(&self) -> Duration {
        self.initial_backoff
    }

    /// Determines whether to retry a failed attempt.
    ///
    /// # Arguments
    ///
    /// * `failure_type` - Classification of the failure
    /// * `retries_so_far` - Retries already performed (0 after the initial attempt fails)
    #[instrument(level = "debug", skip(self), fields(max_retries = self.max_retries))]
    pub fn should_retry(&self, failure_type: FailureType, retries_so_far: u32) -> RetryDecision {
        if failure_type == FailureType::Permanent {
            return RetryDecision::DoNotRetry {
                reason: "permanent failure - retry would not help".to_string(),
            };
        }

        if retries_so_far >= self.max_retries {
            debug!(retries_so_far, max = self.max_retries, "retry budget spent");
            return RetryDecision::DoNotRetry {
                reason: format!("max retries ({}) exhausted", self.max_retries),
            };
        }

        let delay = self.backoff_delay(retries_so_far);
        debug!(
            retry = retries_so_far + 1,
            delay_ms = delay.as_millis(),
            "will retry"
        );

        RetryDecision::Retry {
            delay,
            retry: retries_so_far + 1,
        }
    }

    /// Formula: `initial_backoff * 2^retries_so_far`, saturating on overflow.
    fn backoff_delay(&self, retries_so_far: u32) -> Duration {
        let factor = BACKOFF_MULTIPLIER.saturating_pow(retries_so_far);
        self.initial_backoff.saturating_mul(factor)
    }
}

/// Classifies a failed request attempt for retry decisions.
///
/// | Error | Type |
/// |-------|------|
/// | Timeout | Transient |
/// | I/O: refused, reset, aborted, broken pipe, not connected, timed out, interrupted, unexpected EOF | Transient |
/// | I/O: out of memory, too many open files | Transient |
/// | I/O: anything else | Permanent |
/// | HTTP client: timeout | Transient |
/// | HTTP client: TLS/certificate | Permanent |
/// | HTTP client: connect | Transient |
/// | HTTP client: anything else (malformed response, protocol error) | Permanent |
///
/// HTTP client errors that carry an I/O cause arrive here as
/// [`TransportError::Io`] and are classified by their I/O kind.
#[must_use]
pub fn classify_error(error: &TransportError) -> FailureType {
    match error {
        TransportError::Timeout => FailureType::Transient,
        TransportError::Io { kind, message } => classify_io(*kind, message),
        TransportError::Http(source) => classify_http(source),
    }
}

fn classify_http(error: &reqwest::Error) -> FailureType {
    if error.is_timeout() {
        FailureType::Transient
    } else if is_tls_error(error) {
        FailureType::Permanent
    } else if error.is_connect() {
        FailureType::Transient
    } else {
        FailureType::Permanent
    }
}

#[allow(clippy::match_same_arms)]
fn classify_io(kind: ErrorKind, message: &str) -> FailureType {
    match kind {
        ErrorKind::ConnectionRefused
        | ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted
        | ErrorKind::BrokenPipe
        | ErrorKind::NotConnected
        | ErrorKind::TimedOut
        | ErrorKind::Interrupted
        | ErrorKind::UnexpectedEof => FailureType::Transient,

        // Resource exhaustion
        ErrorKind::OutOfMemory => FailureType::Transient,
        _ if is_fd_exhaustion(message) => FailureType::Transient,

        _ => FailureType::Permanent,
    }
}

fn is_fd_exhaustion(message: &str) -> bool {
    let lowered = message.to_ascii_lowercase();
    lowered.contains("too many open files") || lowered.contains("os error 24")
}

/// Checks if a reqwest error is caused by a TLS/certificate failure.
///
/// Only the cause chain is inspected: reqwest's own message includes the
/// request URL, which must not influence the classification.
fn is_tls_error(error: &reqwest::Error) -> bool {
    let mut source = error.source();
    while let Some(cause) = source {
        let rendered = cause.to_string().to_lowercase();
        if rendered.contains("certificate")
            || rendered.contains("tls")
            || rendered.contains("ssl")
            || rendered.contains("handshake")
        {
            return true;
        }
        source = cause.source();
    }
    false
}
