//! Error types for the redirect check.
//!
//! [`TransportError`] describes a single failed request attempt and feeds the
//! retry classifier. [`CheckError`] is what a fetch or a resolution finally
//! surfaces to its caller once retries are settled.

use thiserror::Error;

/// Failure of a single request attempt, before any retry decision.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// An OS-level I/O error surfaced from the connection.
    #[error("connection error ({kind}): {message}")]
    Io {
        /// Kind of the underlying I/O error.
        kind: std::io::ErrorKind,
        /// Rendered message of the underlying I/O error.
        message: String,
    },

    /// Any other error reported by the HTTP client.
    #[error("HTTP transport error: {0}")]
    Http(#[source] reqwest::Error),
}

impl TransportError {
    /// Creates an I/O transport error.
    pub fn io(kind: std::io::ErrorKind, message: impl Into<String>) -> Self {
        Self::Io {
            kind,
            message: message.into(),
        }
    }
}

/// Errors surfaced by fetching a URL or resolving a redirect chain.
#[derive(Debug, Error)]
pub enum CheckError {
    /// The URL cannot be parsed into scheme, host, path and query.
    #[error("malformed URL '{url}': {reason}")]
    MalformedUrl {
        /// The URL as given.
        url: String,
        /// Why parsing failed.
        reason: String,
    },

    /// The request failed after the retry budget was spent, or failed permanently.
    #[error("network error fetching {url} after {attempts} attempt(s): {source}")]
    Network {
        /// The URL that could not be fetched.
        url: String,
        /// Number of attempts made, including the initial one.
        attempts: u32,
        /// Error of the last attempt.
        #[source]
        source: TransportError,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl CheckError {
    /// Creates a malformed URL error.
    pub fn malformed_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates a network error carrying the last attempt's failure.
    pub fn network(url: impl Into<String>, attempts: u32, source: TransportError) -> Self {
        Self::Network {
            url: url.into(),
            attempts,
            source,
        }
    }
}
