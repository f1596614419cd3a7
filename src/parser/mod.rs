//! Input parsing: turns a delimited file into [`RedirectPair`] rows.
//!
//! The file needs a header row naming at least the source and destination
//! columns (`src` and `destination` unless configured otherwise). Other
//! columns are ignored. The delimiter (comma, semicolon or tab) is detected
//! from the header line.
//!
//! # Example
//!
//! ```
//! use redirect_checker::parser::{ColumnNames, parse_pairs};
//!
//! let text = "src,destination\nhttp://a.example/old,https://a.example/new\n";
//! let result = parse_pairs(text, &ColumnNames::default()).unwrap();
//! assert_eq!(result.len(), 1);
//! assert_eq!(result.pairs[0].expected_destination, "https://a.example/new");
//! ```

mod delimited;
mod error;
mod input;

pub use error::InputError;
pub use input::{
    ColumnNames, DEFAULT_DESTINATION_COLUMN, DEFAULT_SOURCE_COLUMN, ParseResult, RedirectPair,
};

use std::path::Path;

use tracing::{debug, info, instrument};

use delimited::{detect_delimiter, split_records};

/// Byte-order mark some spreadsheet tools prepend to exported files.
const UTF8_BOM: char = '\u{feff}';

/// Parses delimited text into redirect pairs.
///
/// Rows are kept in file order. Rows with an empty source or destination are
/// kept too; deciding what to do with them is left to the caller.
///
/// # Errors
///
/// - [`InputError::MissingColumn`] if a required header is absent
/// - [`InputError::NoRows`] if there is no header, no data row, or no row
///   with both URLs present
pub fn parse_pairs(text: &str, columns: &ColumnNames) -> Result<ParseResult, InputError> {
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);
    let header_line = text
        .lines()
        .find(|line| !line.trim().is_empty())
        .ok_or(InputError::NoRows)?;
    let delimiter = detect_delimiter(header_line);

    let mut records = split_records(text, delimiter).into_iter();
    let headers: Vec<String> = records
        .next()
        .ok_or(InputError::NoRows)?
        .into_iter()
        .map(|header| header.trim().to_string())
        .collect();

    let source_index = column_index(&headers, &columns.source)?;
    let destination_index = column_index(&headers, &columns.destination)?;
    debug!(
        ?delimiter,
        source_index, destination_index, "resolved input columns"
    );

    let pairs: Vec<RedirectPair> = records
        .map(|record| {
            let field = |index: usize| record.get(index).map_or("", String::as_str);
            RedirectPair::new(field(source_index), field(destination_index))
        })
        .collect();

    let result = ParseResult { pairs, delimiter };
    if result.usable_count() == 0 {
        return Err(InputError::NoRows);
    }
    Ok(result)
}

/// Reads and parses an input file.
///
/// # Errors
///
/// Returns [`InputError::Read`] if the file cannot be read as UTF-8, plus the
/// errors of [`parse_pairs`].
#[instrument(skip(columns), fields(path = %path.display()))]
pub fn read_pairs(path: &Path, columns: &ColumnNames) -> Result<ParseResult, InputError> {
    let text = std::fs::read_to_string(path).map_err(|e| InputError::read(path, e))?;
    let result = parse_pairs(&text, columns)?;
    info!(
        rows = result.len(),
        usable = result.usable_count(),
        "read input file"
    );
    Ok(result)
}

fn column_index(headers: &[String], column: &str) -> Result<usize, InputError> {
    headers
        .iter()
        .position(|header| header == column)
        .ok_or_else(|| InputError::missing_column(column, headers))
}
