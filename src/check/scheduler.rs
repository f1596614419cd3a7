//! Batch scheduler: resolves many pairs in fixed-size chunks.
//!
//! Pairs within a chunk are resolved concurrently; the scheduler waits for
//! the whole chunk before sleeping `chunk_delay` and starting the next one.
//! Every completion is recorded into the [`Report`] by the scheduler itself,
//! so the report has a single owner and needs no locking.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use redirect_checker::check::{
//!     BatchScheduler, HeaderFetcher, RedirectResolver, RetryPolicy, ValidityPolicy,
//! };
//! use redirect_checker::parser::RedirectPair;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = HeaderFetcher::new(Duration::from_secs(10), RetryPolicy::default())?;
//! let resolver = RedirectResolver::new(fetcher, ValidityPolicy::default());
//! let scheduler = BatchScheduler::new(resolver, 8, Duration::from_secs(2))?;
//! let pairs = vec![RedirectPair::new("http://a.example/old", "https://a.example/new")];
//! let report = scheduler.run(&pairs).await;
//! println!("{:?}", report.summary());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use futures_util::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, info, instrument, warn};

use super::error::CheckError;
use super::outcome::ResolutionOutcome;
use super::resolver::RedirectResolver;
use crate::parser::RedirectPair;
use crate::report::Report;

/// Error type for batch scheduler construction.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// Chunk size must be at least one.
    #[error("invalid chunk size {value}: must be at least 1")]
    InvalidChunkSize {
        /// The invalid value that was provided.
        value: usize,
    },
}

/// Progress notifications emitted while a batch runs.
#[derive(Debug, Clone, Copy)]
pub enum ProgressEvent<'a> {
    /// A chunk is about to be resolved.
    ChunkStarted {
        /// Zero-based chunk index.
        index: usize,
        /// Number of chunks in the batch.
        count: usize,
        /// Number of pairs in this chunk.
        size: usize,
    },
    /// A pair was resolved.
    Resolved(&'a ResolutionOutcome),
    /// A pair failed to resolve.
    Failed {
        /// The pair that failed.
        pair: &'a RedirectPair,
        /// Why it failed.
        error: &'a CheckError,
    },
    /// A row was skipped because the source or destination was empty.
    Skipped(&'a RedirectPair),
}

/// Runs a resolver over many pairs in delayed chunks.
#[derive(Debug, Clone)]
pub struct BatchScheduler {
    resolver: RedirectResolver,
    chunk_size: usize,
    chunk_delay: Duration,
}

impl BatchScheduler {
    /// Creates a scheduler.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidChunkSize`] if `chunk_size` is zero.
    #[instrument(level = "debug", skip(resolver))]
    pub fn new(
        resolver: RedirectResolver,
        chunk_size: usize,
        chunk_delay: Duration,
    ) -> Result<Self, SchedulerError> {
        if chunk_size == 0 {
            return Err(SchedulerError::InvalidChunkSize { value: chunk_size });
        }
        debug!(
            chunk_size,
            chunk_delay_ms = chunk_delay.as_millis(),
            max_hops = resolver.max_hops(),
            "creating batch scheduler"
        );
        Ok(Self {
            resolver,
            chunk_size,
            chunk_delay,
        })
    }

    /// Returns the configured chunk size.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns the configured delay between chunks.
    #[must_use]
    pub fn chunk_delay(&self) -> Duration {
        self.chunk_delay
    }

    /// Resolves every complete pair and returns the finalized report.
    pub async fn run(&self, pairs: &[RedirectPair]) -> Report {
        self.run_with_observer(pairs, |_| {}).await
    }

    /// Like [`run`](Self::run), calling `observer` for every progress event.
    ///
    /// Individual resolution failures never abort the batch; they are counted
    /// as `errored` and listed in the report.
    #[instrument(skip(self, pairs, observer), fields(rows = pairs.len(), chunk_size = self.chunk_size))]
    pub async fn run_with_observer<F>(&self, pairs: &[RedirectPair], mut observer: F) -> Report
    where
        F: FnMut(ProgressEvent<'_>),
    {
        let mut report = Report::new();

        let mut work: Vec<&RedirectPair> = Vec::with_capacity(pairs.len());
        for pair in pairs {
            if pair.is_complete() {
                work.push(pair);
            } else {
                debug!(%pair, "skipping incomplete row");
                report.record_skipped();
                observer(ProgressEvent::Skipped(pair));
            }
        }

        let count = work.len().div_ceil(self.chunk_size);
        info!(pairs = work.len(), chunks = count, "starting batch");

        for (index, chunk) in work.chunks(self.chunk_size).enumerate() {
            if index > 0 && !self.chunk_delay.is_zero() {
                debug!(delay_ms = self.chunk_delay.as_millis(), "waiting before next chunk");
                tokio::time::sleep(self.chunk_delay).await;
            }

            info!(chunk = index + 1, chunks = count, size = chunk.len(), "processing chunk");
            observer(ProgressEvent::ChunkStarted {
                index,
                count,
                size: chunk.len(),
            });

            let mut in_flight: FuturesUnordered<_> = chunk
                .iter()
                .map(|pair| async move {
                    let result = self
                        .resolver
                        .resolve(&pair.source, &pair.expected_destination)
                        .await;
                    (*pair, result)
                })
                .collect();

            while let Some((pair, result)) = in_flight.next().await {
                match result {
                    Ok(outcome) => {
                        observer(ProgressEvent::Resolved(&outcome));
                        report.record_outcome(outcome);
                    }
                    Err(error) => {
                        warn!(source = %pair.source, error = %error, "resolution failed");
                        report.record_failure(pair, &error);
                        observer(ProgressEvent::Failed {
                            pair,
                            error: &error,
                        });
                    }
                }
            }
        }

        report.finalize();
        let summary = report.summary();
        info!(
            valid = summary.valid,
            invalid = summary.invalid,
            errored = summary.errored,
            skipped = summary.skipped,
            "batch complete"
        );
        report
    }
}
