//! Upload decoding: delimited text and spreadsheet files into raw rows.
//!
//! # Responsibility
//! - Resolve the upload format from the declared file name.
//! - Decode bytes into a header list plus loosely-typed rows.
//!
//! # Invariants
//! - Format resolution happens before any byte is inspected.
//! - Empty uploads decode to an empty table; emptiness is reported by the
//!   schema validator, not here.
//! - Row keys keep header order.

mod delimited;
mod spreadsheet;

use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ImportResult<T> = Result<T, ImportError>;

/// Recognized upload families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// `.csv`
    Delimited,
    /// `.xlsx`, `.xls`
    Spreadsheet,
}

impl FileFormat {
    /// Extensions accepted for upload, lower-case and without the dot.
    pub const ACCEPTED_EXTENSIONS: [&'static str; 3] = ["csv", "xlsx", "xls"];

    /// Resolves the format from a file name's last extension, ignoring case.
    pub fn from_file_name(file_name: &str) -> ImportResult<Self> {
        let extension = file_name
            .trim()
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(Self::Delimited),
            "xlsx" | "xls" => Ok(Self::Spreadsheet),
            _ => Err(ImportError::UnsupportedFormat(file_name.trim().to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Delimited => "csv",
            Self::Spreadsheet => "spreadsheet",
        }
    }
}

/// Decoding failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    /// File name does not end in an accepted extension.
    UnsupportedFormat(String),
    /// Content could not be decoded as the declared format.
    Parse { format: FileFormat, message: String },
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedFormat(file_name) => write!(
                f,
                "unsupported file `{file_name}`; expected one of: {}",
                FileFormat::ACCEPTED_EXTENSIONS
                    .iter()
                    .map(|ext| format!(".{ext}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Self::Parse { format, message } => {
                write!(f, "failed to parse {} file: {message}", format.as_str())
            }
        }
    }
}

impl Error for ImportError {}

/// One decoded cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    /// Renders the cell as text.
    ///
    /// Integral numbers print without a fractional part so phone numbers
    /// stored as numeric cells come back as digits.
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(value) => value.clone(),
            Self::Number(value) => format_number(*value),
            Self::Bool(value) => value.to_string(),
        }
    }
}

const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < MAX_EXACT_INTEGER {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// One decoded data row: `(header, value)` pairs in header order.
///
/// Cells that were absent in the source (short CSV lines, empty spreadsheet
/// cells) have no entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: Vec<(String, CellValue)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: CellValue) {
        self.cells.push((key.into(), value));
    }

    /// Exact-key lookup.
    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, value)| value)
    }

    /// Case-insensitive, whitespace-trimmed key lookup; first match wins.
    pub fn get_ignore_case(&self, key: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(candidate, _)| candidate.trim().eq_ignore_ascii_case(key))
            .map(|(_, value)| value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl FromIterator<(String, CellValue)> for RawRow {
    fn from_iter<T: IntoIterator<Item = (String, CellValue)>>(iter: T) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

/// Decoded upload: header names plus data rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl ParsedTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Decodes `bytes` according to `format`.
pub fn parse_table(format: FileFormat, bytes: &[u8]) -> ImportResult<ParsedTable> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(ParsedTable::default());
    }

    match format {
        FileFormat::Delimited => delimited::parse(bytes),
        FileFormat::Spreadsheet => spreadsheet::parse(bytes),
    }
}

/// Resolves the format from `file_name`, then decodes `bytes`.
pub fn parse_upload(file_name: &str, bytes: &[u8]) -> ImportResult<ParsedTable> {
    let format = FileFormat::from_file_name(file_name)?;
    parse_table(format, bytes)
}
