//! Aggregated check report and its JSON writer.
//!
//! The [`Report`] is filled in while the batch runs: every resolved pair adds
//! one [`ResolutionOutcome`] and bumps either `valid` or `invalid`. Failed
//! resolutions land in a separate `errors` list and `errored` counter, so
//! `total == valid + invalid == outcomes.len()` holds at every step.
//!
//! The persisted document looks like:
//!
//! ```text
//! {
//!   "result": { "valid": 1, "invalid": 1, "total": 2, "errored": 0, "skipped": 0 },
//!   "urls": [ { "source": ..., "isValid": false, "status": "invalid", "reasons": [...] }, ... ],
//!   "errors": []
//! }
//! ```

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::check::{CheckError, ResolutionOutcome};
use crate::parser::RedirectPair;

/// Suffix appended to the input file stem to name the report.
const REPORT_SUFFIX: &str = ".report.json";

/// Counts over all processed rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Pairs that passed the validity policy.
    pub valid: usize,
    /// Pairs that were resolved but failed the validity policy.
    pub invalid: usize,
    /// Resolved pairs (`valid + invalid`).
    pub total: usize,
    /// Pairs whose resolution failed with an error.
    pub errored: usize,
    /// Rows skipped because the source or destination was empty.
    pub skipped: usize,
}

/// A pair whose resolution failed before a verdict could be reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionFailure {
    /// URL the resolution started from.
    pub source: String,
    /// URL the pair was expected to reach.
    pub expected_destination: String,
    /// Rendered error.
    pub error: String,
}

/// Results of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    summary: Summary,
    outcomes: Vec<ResolutionOutcome>,
    errors: Vec<ResolutionFailure>,
}

impl Report {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the summary counts.
    #[must_use]
    pub fn summary(&self) -> Summary {
        self.summary
    }

    /// Returns the resolved outcomes.
    #[must_use]
    pub fn outcomes(&self) -> &[ResolutionOutcome] {
        &self.outcomes
    }

    /// Returns the failed resolutions.
    #[must_use]
    pub fn errors(&self) -> &[ResolutionFailure] {
        &self.errors
    }

    /// Appends an outcome and bumps the matching counter.
    pub fn record_outcome(&mut self, outcome: ResolutionOutcome) {
        if outcome.is_valid {
            self.summary.valid += 1;
        } else {
            self.summary.invalid += 1;
        }
        self.summary.total += 1;
        self.outcomes.push(outcome);
    }

    /// Records a pair whose resolution failed.
    pub fn record_failure(&mut self, pair: &RedirectPair, error: &CheckError) {
        self.summary.errored += 1;
        self.errors.push(ResolutionFailure {
            source: pair.source.clone(),
            expected_destination: pair.expected_destination.clone(),
            error: error.to_string(),
        });
    }

    /// Counts a row that was skipped before resolution.
    pub fn record_skipped(&mut self) {
        self.summary.skipped += 1;
    }

    /// Orders outcomes for presentation: invalid first, then valid, each by source.
    pub fn finalize(&mut self) {
        self.outcomes.sort_by(compare_outcomes);
        self.errors.sort_by(|a, b| a.source.cmp(&b.source));
    }
}

fn compare_outcomes(a: &ResolutionOutcome, b: &ResolutionOutcome) -> Ordering {
    a.is_valid
        .cmp(&b.is_valid)
        .then_with(|| a.source.cmp(&b.source))
}

/// One outcome plus display annotations.
#[derive(Serialize)]
struct AnnotatedOutcome<'a> {
    #[serde(flatten)]
    outcome: &'a ResolutionOutcome,
    status: &'static str,
    reasons: Vec<String>,
}

/// Persisted report layout.
#[derive(Serialize)]
struct ReportDocument<'a> {
    result: Summary,
    urls: Vec<AnnotatedOutcome<'a>>,
    errors: &'a [ResolutionFailure],
}

impl<'a> From<&'a Report> for ReportDocument<'a> {
    fn from(report: &'a Report) -> Self {
        Self {
            result: report.summary,
            urls: report
                .outcomes
                .iter()
                .map(|outcome| AnnotatedOutcome {
                    outcome,
                    status: if outcome.is_valid { "valid" } else { "invalid" },
                    reasons: outcome.reasons(),
                })
                .collect(),
            errors: &report.errors,
        }
    }
}

/// Errors that can occur while writing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serializing the report failed.
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Writing the report file failed.
    #[error("IO error writing report to {path}: {source}")]
    Io {
        /// Report path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Renders the report as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`ReportError::Serialize`] if serialization fails.
pub fn render_report(report: &Report) -> Result<String, ReportError> {
    Ok(serde_json::to_string_pretty(&ReportDocument::from(report))?)
}

/// Writes the report to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ReportError`] if serialization or any file operation fails.
#[instrument(skip(report), fields(path = %path.display()))]
pub fn write_report(report: &Report, path: &Path) -> Result<(), ReportError> {
    let rendered = render_report(report)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ReportError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, rendered).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("report written");
    Ok(())
}

/// Derives the report path from the input file: `<dir>/<stem>.report.json`.
///
/// `<dir>` is `output_dir` when given, otherwise the input file's directory.
#[must_use]
pub fn report_path_for(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "redirects".into(), |s| s.to_string_lossy());
    let dir = output_dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    dir.join(format!("{stem}{REPORT_SUFFIX}"))
}
