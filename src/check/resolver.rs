//! Redirect resolver: follows one chain hop by hop and produces its verdict.
//!
//! State is `(current_url, chain, hop_count)`, starting at the source with an
//! empty chain. Each fetched response carrying a `Location` appends a hop and
//! moves to the new URL. Resolution ends either naturally (a response without
//! `Location`, judged by the [`ValidityPolicy`]) or at the hop limit, which is
//! always invalid.

use tracing::{debug, instrument};
use url::Url;

use super::client::HeaderFetcher;
use super::constants::DEFAULT_MAX_REDIRECTIONS;
use super::error::CheckError;
use super::outcome::{RedirectHop, ResolutionOutcome};
use super::policy::{ValidityPolicy, Verdict};

/// Follows redirect chains for (source, expected destination) pairs.
#[derive(Debug, Clone)]
pub struct RedirectResolver {
    fetcher: HeaderFetcher,
    policy: ValidityPolicy,
    max_hops: u32,
}

impl RedirectResolver {
    /// Creates a resolver with the default hop limit.
    #[must_use]
    pub fn new(fetcher: HeaderFetcher, policy: ValidityPolicy) -> Self {
        Self::with_max_hops(fetcher, policy, DEFAULT_MAX_REDIRECTIONS)
    }

    /// Creates a resolver that stops after `max_hops` redirects.
    #[must_use]
    pub fn with_max_hops(fetcher: HeaderFetcher, policy: ValidityPolicy, max_hops: u32) -> Self {
        Self {
            fetcher,
            policy,
            max_hops,
        }
    }

    /// Returns the configured hop limit.
    #[must_use]
    pub fn max_hops(&self) -> u32 {
        self.max_hops
    }

    /// Resolves `source` and judges it against `expected_destination`.
    ///
    /// Redirect problems (too many hops, wrong destination, wrong codes) are
    /// reported in the outcome, not as errors.
    ///
    /// # Errors
    ///
    /// Propagates [`CheckError`] from the underlying fetch.
    #[instrument(skip(self), fields(max_hops = self.max_hops))]
    pub async fn resolve(
        &self,
        source: &str,
        expected_destination: &str,
    ) -> Result<ResolutionOutcome, CheckError> {
        let mut current_url = source.to_string();
        let mut chain: Vec<RedirectHop> = Vec::new();
        let mut hop_count = 0u32;

        loop {
            let hop = self.fetcher.fetch(&current_url).await?;

            let Some(location) = hop.location else {
                let verdict = self.policy.evaluate(
                    &current_url,
                    expected_destination,
                    &chain,
                    hop_count,
                    hop.status_code,
                );
                debug!(hop_count, valid = verdict.is_valid(), "chain complete");
                return Ok(build_outcome(
                    source,
                    expected_destination,
                    current_url,
                    hop.status_code,
                    hop_count,
                    chain,
                    verdict,
                ));
            };

            let next_url = absolutize_location(&current_url, &location);
            debug!(status = hop.status_code, from = %current_url, to = %next_url, "redirect");
            chain.push(RedirectHop::new(next_url.clone(), hop.status_code));
            hop_count += 1;
            current_url = next_url;

            if hop_count >= self.max_hops {
                debug!(hop_count, "hop limit reached");
                return Ok(build_outcome(
                    source,
                    expected_destination,
                    current_url,
                    hop.status_code,
                    hop_count,
                    chain,
                    Verdict::hop_limit_exceeded(self.max_hops),
                ));
            }
        }
    }
}

fn build_outcome(
    source: &str,
    expected_destination: &str,
    actual_destination: String,
    final_status_code: u16,
    hop_count: u32,
    chain: Vec<RedirectHop>,
    verdict: Verdict,
) -> ResolutionOutcome {
    ResolutionOutcome {
        final_status_code,
        source: source.to_string(),
        expected_destination: expected_destination.to_string(),
        actual_destination,
        hop_count,
        chain,
        is_valid: verdict.is_valid(),
        violations: verdict.into_violations(),
    }
}

/// Absolute `Location` values are kept verbatim so destination comparison
/// stays an exact string match; relative ones are joined onto the current URL.
fn absolutize_location(current_url: &str, location: &str) -> String {
    if Url::parse(location).is_ok() {
        return location.to_string();
    }
    Url::parse(current_url)
        .and_then(|base| base.join(location))
        .map_or_else(|_| location.to_string(), String::from)
}
