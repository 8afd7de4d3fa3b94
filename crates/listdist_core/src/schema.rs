//! Required-column check and row normalization.
//!
//! # Responsibility
//! - Confirm the upload carries the `FirstName`, `Phone` and `Notes` columns.
//! - Turn loosely-typed rows into canonical `ContactRecord`s.
//!
//! # Invariants
//! - Column names match case-insensitively after trimming.
//! - Every missing column is reported, in canonical order.
//! - `Notes` defaults to an empty string; unknown columns are discarded.
//! - `FirstName` and `Phone` must be non-blank on every row.

use crate::import::{ParsedTable, RawRow};
use crate::model::contact::ContactRecord;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const FIRST_NAME_COLUMN: &str = "FirstName";
pub const PHONE_COLUMN: &str = "Phone";
pub const NOTES_COLUMN: &str = "Notes";

/// Required columns in canonical order.
pub const REQUIRED_COLUMNS: [&str; 3] = [FIRST_NAME_COLUMN, PHONE_COLUMN, NOTES_COLUMN];

pub type SchemaResult<T> = Result<T, SchemaError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The upload has no data rows.
    EmptyInput,
    /// Required columns absent from the header.
    MissingColumns(Vec<&'static str>),
    /// A required value is blank. `row` is the 1-based data row number.
    BlankRequiredValue { row: usize, column: &'static str },
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "the file is empty"),
            Self::MissingColumns(columns) => {
                write!(f, "missing required columns: {}", columns.join(", "))
            }
            Self::BlankRequiredValue { row, column } => {
                write!(f, "row {row}: {column} must not be empty")
            }
        }
    }
}

impl Error for SchemaError {}

/// Validates the header and normalizes every row.
///
/// Checks run in order: empty input, missing columns, then per-row values.
pub fn validate_table(table: &ParsedTable) -> SchemaResult<Vec<ContactRecord>> {
    if table.rows.is_empty() {
        return Err(SchemaError::EmptyInput);
    }

    let missing = missing_columns(table.headers.iter().map(String::as_str));
    if !missing.is_empty() {
        return Err(SchemaError::MissingColumns(missing));
    }

    table
        .rows
        .iter()
        .enumerate()
        .map(|(index, row)| normalize_row(index + 1, row))
        .collect()
}

/// Returns required columns with no case-insensitive match in `headers`.
pub fn missing_columns<'a>(
    headers: impl IntoIterator<Item = &'a str> + Clone,
) -> Vec<&'static str> {
    REQUIRED_COLUMNS
        .into_iter()
        .filter(|required| {
            !headers
                .clone()
                .into_iter()
                .any(|header| header.trim().eq_ignore_ascii_case(required))
        })
        .collect()
}

fn normalize_row(row_number: usize, row: &RawRow) -> SchemaResult<ContactRecord> {
    let text = |column: &str| {
        row.get_ignore_case(column)
            .map(|value| value.to_text().trim().to_string())
            .unwrap_or_default()
    };

    let record = ContactRecord::new(
        text(FIRST_NAME_COLUMN),
        text(PHONE_COLUMN),
        text(NOTES_COLUMN),
    );
    if let Some(column) = record.first_blank_required() {
        return Err(SchemaError::BlankRequiredValue {
            row: row_number,
            column,
        });
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::{missing_columns, validate_table, SchemaError};
    use crate::import::{CellValue, ParsedTable, RawRow};

    fn table(headers: &[&str], rows: &[&[(&str, CellValue)]]) -> ParsedTable {
        ParsedTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|cells| {
                    cells
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.clone()))
                        .collect::<RawRow>()
                })
                .collect(),
        }
    }

    fn text(value: &str) -> CellValue {
        CellValue::Text(value.to_string())
    }

    #[test]
    fn empty_rows_fail_before_header_checks() {
        let err = validate_table(&table(&["name"], &[])).unwrap_err();
        assert_eq!(err, SchemaError::EmptyInput);
    }

    #[test]
    fn any_letter_casing_matches() {
        for headers in [
            ["FIRSTNAME", "PHONE", "NOTES"],
            ["firstname", "phone", "notes"],
            ["FirstName", "Phone", "Notes"],
        ] {
            assert!(missing_columns(headers).is_empty());
        }
    }

    #[test]
    fn every_missing_column_is_named_in_canonical_order() {
        assert_eq!(
            missing_columns(["name", "ph", "note"]),
            vec!["FirstName", "Phone", "Notes"]
        );
        assert_eq!(missing_columns(["notes", "firstname"]), vec!["Phone"]);
    }

    #[test]
    fn rows_are_normalized_to_canonical_keys() {
        let parsed = table(
            &["FIRSTNAME", "phone", "Notes", "City"],
            &[
                &[
                    ("FIRSTNAME", text(" Ana ")),
                    ("phone", CellValue::Number(5550100.0)),
                    ("Notes", text("vip")),
                    ("City", text("Lisbon")),
                ],
                &[("FIRSTNAME", text("Ben")), ("phone", text("555-0101"))],
            ],
        );

        let records = validate_table(&parsed).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].first_name, "Ana");
        assert_eq!(records[0].phone, "5550100");
        assert_eq!(records[0].notes, "vip");
        assert_eq!(records[1].notes, "");
    }

    #[test]
    fn blank_required_value_reports_row_and_column() {
        let parsed = table(
            &["FirstName", "Phone", "Notes"],
            &[
                &[("FirstName", text("Ana")), ("Phone", text("1"))],
                &[("FirstName", text("Ben")), ("Phone", text("  "))],
            ],
        );

        assert_eq!(
            validate_table(&parsed).unwrap_err(),
            SchemaError::BlankRequiredValue {
                row: 2,
                column: "Phone"
            }
        );
    }

    #[test]
    fn missing_columns_message_lists_all() {
        let err = SchemaError::MissingColumns(vec!["FirstName", "Phone", "Notes"]);
        assert_eq!(
            err.to_string(),
            "missing required columns: FirstName, Phone, Notes"
        );
    }
}
