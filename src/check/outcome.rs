//! Value types produced while resolving a redirect chain.

use std::fmt;

use serde::Serialize;

use super::policy::Violation;

/// Status code and `Location` header captured from one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HopResult {
    /// HTTP status code of the response.
    pub status_code: u16,
    /// `Location` header value, if present and non-empty.
    pub location: Option<String>,
}

impl HopResult {
    /// Creates a hop result.
    #[must_use]
    pub fn new(status_code: u16, location: Option<String>) -> Self {
        Self {
            status_code,
            location,
        }
    }
}

/// One redirect encountered while following a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectHop {
    /// Target of the redirect (absolute URL).
    pub location: String,
    /// Status code of the response that carried the redirect.
    pub status_code: u16,
}

impl RedirectHop {
    /// Creates a redirect hop.
    #[must_use]
    pub fn new(location: impl Into<String>, status_code: u16) -> Self {
        Self {
            location: location.into(),
            status_code,
        }
    }
}

impl fmt::Display for RedirectHop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.status_code, self.location)
    }
}

/// Verdict for one (source, expected destination) pair.
///
/// Produced exactly once per pair by the resolver and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionOutcome {
    /// Status code of the last response fetched.
    pub final_status_code: u16,
    /// URL the chain started from.
    pub source: String,
    /// URL the chain was expected to end at.
    pub expected_destination: String,
    /// URL the chain actually ended at.
    pub actual_destination: String,
    /// Number of redirects followed.
    pub hop_count: u32,
    /// Redirects in traversal order.
    pub chain: Vec<RedirectHop>,
    /// Whether the pair satisfies the validity policy.
    pub is_valid: bool,
    /// Policy rules the pair broke; empty when valid.
    #[serde(skip)]
    pub violations: Vec<Violation>,
}

impl ResolutionOutcome {
    /// Human-readable reasons for an invalid verdict.
    #[must_use]
    pub fn reasons(&self) -> Vec<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }
}
