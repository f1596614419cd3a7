//! Validity policy: one clean permanent redirect, then success.
//!
//! A pair passes only when all of these hold:
//! 1. the chain ends exactly at the expected destination (string equality),
//! 2. exactly one redirect hop occurred,
//! 3. that hop used a permanent redirect code (301/308 by default),
//! 4. the final response is exactly HTTP 200.
//!
//! Soft redirects (302/303/307), multi-hop chains, "already correct" URLs that
//! answer 200 without redirecting and 2xx codes other than 200 all fail.

use std::collections::BTreeSet;
use std::fmt;

use super::constants::DEFAULT_PERMANENT_REDIRECT_CODES;
use super::outcome::RedirectHop;

/// Final status code required at the destination.
const REQUIRED_FINAL_STATUS: u16 = 200;

/// Number of redirect hops required.
const REQUIRED_HOP_COUNT: u32 = 1;

/// A policy rule broken by a resolved chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// The chain ended somewhere other than the expected destination.
    DestinationMismatch {
        /// Where the chain ended.
        actual: String,
        /// Where it should have ended.
        expected: String,
    },
    /// The chain did not have exactly one hop.
    HopCount {
        /// Hops actually followed.
        found: u32,
    },
    /// The first hop was not a permanent redirect.
    NonPermanentRedirect {
        /// Status of the first hop, `None` if no hop was recorded.
        status_code: Option<u16>,
    },
    /// The final response was not HTTP 200.
    FinalStatus {
        /// Status actually returned.
        found: u16,
    },
    /// Resolution stopped because the chain kept redirecting.
    HopLimitExceeded {
        /// The configured hop limit.
        max_hops: u32,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DestinationMismatch { actual, expected } => {
                write!(f, "ended at {actual} instead of {expected}")
            }
            Self::HopCount { found } => {
                write!(
                    f,
                    "expected exactly {REQUIRED_HOP_COUNT} redirect hop, found {found}"
                )
            }
            Self::NonPermanentRedirect {
                status_code: Some(code),
            } => write!(f, "redirect used {code}, which is not a permanent redirect"),
            Self::NonPermanentRedirect { status_code: None } => {
                write!(f, "no redirect hop recorded")
            }
            Self::FinalStatus { found } => {
                write!(f, "final status {found}, expected {REQUIRED_FINAL_STATUS}")
            }
            Self::HopLimitExceeded { max_hops } => {
                write!(f, "still redirecting after {max_hops} hops")
            }
        }
    }
}

/// Result of evaluating a chain against the policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verdict {
    violations: Vec<Violation>,
}

impl Verdict {
    /// Verdict for a chain cut short at the hop limit.
    #[must_use]
    pub fn hop_limit_exceeded(max_hops: u32) -> Self {
        Self {
            violations: vec![Violation::HopLimitExceeded { max_hops }],
        }
    }

    /// Returns true when no rule was broken.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Rules that were broken, in rule order.
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Consumes the verdict, returning its violations.
    #[must_use]
    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }
}

/// Pure decision function over a resolved chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidityPolicy {
    permanent_codes: BTreeSet<u16>,
}

impl Default for ValidityPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_PERMANENT_REDIRECT_CODES)
    }
}

impl ValidityPolicy {
    /// Creates a policy accepting the given status codes as permanent redirects.
    #[must_use]
    pub fn new(permanent_codes: impl IntoIterator<Item = u16>) -> Self {
        Self {
            permanent_codes: permanent_codes.into_iter().collect(),
        }
    }

    /// Returns true if `status_code` counts as a permanent redirect.
    #[must_use]
    pub fn is_permanent(&self, status_code: u16) -> bool {
        self.permanent_codes.contains(&status_code)
    }

    /// Evaluates every rule and collects the ones that fail.
    #[must_use]
    pub fn evaluate(
        &self,
        final_url: &str,
        expected_destination: &str,
        chain: &[RedirectHop],
        hop_count: u32,
        final_status_code: u16,
    ) -> Verdict {
        let mut violations = Vec::new();

        if final_url != expected_destination {
            violations.push(Violation::DestinationMismatch {
                actual: final_url.to_string(),
                expected: expected_destination.to_string(),
            });
        }

        if hop_count != REQUIRED_HOP_COUNT {
            violations.push(Violation::HopCount { found: hop_count });
        }

        match chain.first() {
            Some(hop) if self.is_permanent(hop.status_code) => {}
            Some(hop) => violations.push(Violation::NonPermanentRedirect {
                status_code: Some(hop.status_code),
            }),
            // A hop count without a recorded hop cannot vouch for the redirect code.
            None if hop_count > 0 => {
                violations.push(Violation::NonPermanentRedirect { status_code: None });
            }
            None => {}
        }

        if final_status_code != REQUIRED_FINAL_STATUS {
            violations.push(Violation::FinalStatus {
                found: final_status_code,
            });
        }

        Verdict { violations }
    }

    /// Returns true iff all four rules hold.
    #[must_use]
    pub fn is_valid(
        &self,
        final_url: &str,
        expected_destination: &str,
        chain: &[RedirectHop],
        hop_count: u32,
        final_status_code: u16,
    ) -> bool {
        self.evaluate(
            final_url,
            expected_destination,
            chain,
            hop_count,
            final_status_code,
        )
        .is_valid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEST: &str = "https://a.example/new";

    fn one_hop(code: u16) -> Vec<RedirectHop> {
        vec![RedirectHop::new(DEST, code)]
    }

    #[test]
    fn test_single_permanent_hop_to_destination_is_valid() {
        let policy = ValidityPolicy::default();
        assert!(policy.is_valid(DEST, DEST, &one_hop(301), 1, 200));
        assert!(policy.is_valid(DEST, DEST, &one_hop(308), 1, 200));
    }

    #[test]
    fn test_wrong_final_url_is_invalid() {
        let policy = ValidityPolicy::default();
        let verdict = policy.evaluate("https://a.example/other", DEST, &one_hop(301), 1, 200);
        assert!(!verdict.is_valid());
        assert_eq!(
            verdict.violations(),
            [Violation::DestinationMismatch {
                actual: "https://a.example/other".to_string(),
                expected: DEST.to_string(),
            }]
        );
    }

    #[test]
    fn test_trailing_slash_difference_is_a_mismatch() {
        let policy = ValidityPolicy::default();
        assert!(!policy.is_valid("https://a.example/new/", DEST, &one_hop(301), 1, 200));
    }

    #[test]
    fn test_zero_hops_is_invalid() {
        let policy = ValidityPolicy::default();
        let verdict = policy.evaluate(DEST, DEST, &[], 0, 200);
        assert!(!verdict.is_valid());
        assert_eq!(verdict.violations(), [Violation::HopCount { found: 0 }]);
    }

    #[test]
    fn test_two_hops_is_invalid() {
        let policy = ValidityPolicy::default();
        let chain = vec![
            RedirectHop::new("https://a.example/mid", 301),
            RedirectHop::new(DEST, 301),
        ];
        let verdict = policy.evaluate(DEST, DEST, &chain, 2, 200);
        assert_eq!(verdict.violations(), [Violation::HopCount { found: 2 }]);
    }

    #[test]
    fn test_temporary_redirect_codes_are_invalid() {
        let policy = ValidityPolicy::default();
        for code in [302, 303, 307] {
            let verdict = policy.evaluate(DEST, DEST, &one_hop(code), 1, 200);
            assert_eq!(
                verdict.violations(),
                [Violation::NonPermanentRedirect {
                    status_code: Some(code)
                }],
                "code {code} should be rejected"
            );
        }
    }

    #[test]
    fn test_final_status_204_is_invalid() {
        let policy = ValidityPolicy::default();
        let verdict = policy.evaluate(DEST, DEST, &one_hop(301), 1, 204);
        assert_eq!(verdict.violations(), [Violation::FinalStatus { found: 204 }]);
    }

    #[test]
    fn test_hop_count_without_chain_is_invalid() {
        let policy = ValidityPolicy::default();
        let verdict = policy.evaluate(DEST, DEST, &[], 1, 200);
        assert_eq!(
            verdict.violations(),
            [Violation::NonPermanentRedirect { status_code: None }]
        );
    }

    #[test]
    fn test_custom_permanent_codes() {
        let policy = ValidityPolicy::new([301]);
        assert!(policy.is_valid(DEST, DEST, &one_hop(301), 1, 200));
        assert!(!policy.is_valid(DEST, DEST, &one_hop(308), 1, 200));
    }

    #[test]
    fn test_violations_are_reported_in_rule_order() {
        let policy = ValidityPolicy::default();
        let verdict = policy.evaluate("https://elsewhere.example/", DEST, &one_hop(302), 1, 404);
        assert_eq!(verdict.violations().len(), 3);
        assert!(matches!(
            verdict.violations()[0],
            Violation::DestinationMismatch { .. }
        ));
        assert!(matches!(
            verdict.violations()[1],
            Violation::NonPermanentRedirect { .. }
        ));
        assert!(matches!(
            verdict.violations()[2],
            Violation::FinalStatus { .. }
        ));
    }

    #[test]
    fn test_hop_limit_verdict_is_invalid() {
        let verdict = Verdict::hop_limit_exceeded(3);
        assert!(!verdict.is_valid());
        assert_eq!(verdict.violations()[0].to_string(), "still redirecting after 3 hops");
    }
}
