//! Error types for reading the input file.

use std::path::PathBuf;

use thiserror::Error;

/// Structural problems with the input file. All of them abort the run.
#[derive(Debug, Error)]
pub enum InputError {
    /// The file could not be read.
    #[error("cannot read input file {path}: {source}")]
    Read {
        /// Path of the input file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A required column header is absent.
    #[error(
        "input is missing required column '{column}' (found: {})\n  Suggestion: rename the header or pass --source-column/--destination-column",
        .available.join(", ")
    )]
    MissingColumn {
        /// The column that was not found.
        column: String,
        /// Headers that were present.
        available: Vec<String>,
    },

    /// The file has no header or no row with both URLs filled in.
    #[error("input contains no usable rows")]
    NoRows,
}

impl InputError {
    /// Creates a read error.
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates a missing column error.
    pub fn missing_column(column: impl Into<String>, available: &[String]) -> Self {
        Self::MissingColumn {
            column: column.into(),
            available: available.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_column_display_lists_headers() {
        let error = InputError::missing_column("src", &["from".to_string(), "to".to_string()]);
        let msg = error.to_string();
        assert!(msg.contains("'src'"), "Expected column in: {msg}");
        assert!(msg.contains("from, to"), "Expected headers in: {msg}");
    }

    #[test]
    fn test_read_error_display_includes_path() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let error = InputError::read("/tmp/rules.csv", io_error);
        let msg = error.to_string();
        assert!(msg.contains("/tmp/rules.csv"), "Expected path in: {msg}");
    }
}
