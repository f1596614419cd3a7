//! Progress bar and per-pair log lines for batch runs.

use indicatif::{ProgressBar, ProgressStyle};
use redirect_checker::check::ProgressEvent;
use tracing::{debug, info, warn};

const BAR_TEMPLATE: &str = "{bar:40.cyan/blue} {pos}/{len} {msg}";

/// Reports scheduler events on an optional progress bar.
pub(crate) struct CheckProgress {
    bar: Option<ProgressBar>,
}

impl CheckProgress {
    /// Creates the reporter; no bar is drawn when `show_bar` is false.
    pub(crate) fn new(show_bar: bool, total: usize) -> Self {
        let bar = show_bar.then(|| {
            let bar = ProgressBar::new(total as u64);
            bar.set_style(
                ProgressStyle::with_template(BAR_TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        });
        Self { bar }
    }

    /// Handles one scheduler event.
    pub(crate) fn observe(&self, event: ProgressEvent<'_>) {
        match event {
            ProgressEvent::ChunkStarted { index, count, size } => {
                debug!(chunk = index + 1, chunks = count, size, "chunk started");
                if let Some(bar) = &self.bar {
                    bar.set_message(format!("chunk {}/{}", index + 1, count));
                }
            }
            ProgressEvent::Resolved(outcome) => {
                if outcome.is_valid {
                    info!(source = %outcome.source, "valid");
                } else {
                    info!(
                        source = %outcome.source,
                        reasons = %outcome.reasons().join("; "),
                        "invalid"
                    );
                }
                self.advance();
            }
            ProgressEvent::Failed { pair, error } => {
                warn!(source = %pair.source, %error, "check failed");
                self.advance();
            }
            ProgressEvent::Skipped(pair) => {
                debug!(%pair, "skipped");
            }
        }
    }

    /// Clears the bar.
    pub(crate) fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }

    fn advance(&self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }
}
