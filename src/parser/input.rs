//! Types representing parsed input rows and results.

use std::fmt;

/// Default header of the source URL column.
pub const DEFAULT_SOURCE_COLUMN: &str = "src";

/// Default header of the expected destination column.
pub const DEFAULT_DESTINATION_COLUMN: &str = "destination";

/// One redirect rule to check: where we start and where we must land.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RedirectPair {
    /// URL the redirect starts from.
    pub source: String,
    /// URL the redirect must end at.
    pub expected_destination: String,
}

impl RedirectPair {
    /// Creates a pair, trimming surrounding whitespace from both URLs.
    #[must_use]
    pub fn new(source: impl AsRef<str>, expected_destination: impl AsRef<str>) -> Self {
        Self {
            source: source.as_ref().trim().to_string(),
            expected_destination: expected_destination.as_ref().trim().to_string(),
        }
    }

    /// Returns true if both the source and the destination are non-empty.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.source.is_empty() && !self.expected_destination.is_empty()
    }
}

impl fmt::Display for RedirectPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.source, self.expected_destination)
    }
}

/// Header names of the two required input columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNames {
    /// Header of the source URL column.
    pub source: String,
    /// Header of the expected destination column.
    pub destination: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE_COLUMN.to_string(),
            destination: DEFAULT_DESTINATION_COLUMN.to_string(),
        }
    }
}

impl ColumnNames {
    /// Creates column names from explicit headers.
    #[must_use]
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

/// Rows read from an input file.
#[derive(Debug, Default)]
pub struct ParseResult {
    /// One pair per data row, in file order, including incomplete rows.
    pub pairs: Vec<RedirectPair>,
    /// Field delimiter detected from the header line.
    pub delimiter: char,
}

impl ParseResult {
    /// Returns true if no data rows were read.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Returns the number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns the number of rows with both URLs present.
    #[must_use]
    pub fn usable_count(&self) -> usize {
        self.pairs.iter().filter(|pair| pair.is_complete()).count()
    }
}

impl fmt::Display for ParseResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Parsed {} rows ({} usable)",
            self.len(),
            self.usable_count()
        )
    }
}
