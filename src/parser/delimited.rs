//! Minimal delimited-text reader (comma, semicolon or tab separated).
//!
//! Supports double-quoted fields with `""` escapes; quoted fields may contain
//! the delimiter and line breaks. Blank records are dropped.

/// Picks the delimiter from the header line: tab, then semicolon, then comma.
#[must_use]
pub(crate) fn detect_delimiter(header_line: &str) -> char {
    if header_line.contains('\t') {
        '\t'
    } else if header_line.contains(';') && !header_line.contains(',') {
        ';'
    } else {
        ','
    }
}

/// Splits `text` into records of fields.
#[must_use]
pub(crate) fn split_records(text: &str, delimiter: char) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.trim().is_empty() => {
                field.clear();
                in_quotes = true;
            }
            '\r' => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                push_record(&mut records, std::mem::take(&mut record));
            }
            c if c == delimiter => record.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }

    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        push_record(&mut records, record);
    }

    records
}

fn push_record(records: &mut Vec<Vec<String>>, record: Vec<String>) {
    if record.iter().any(|value| !value.trim().is_empty()) {
        records.push(record);
    }
}
