//! CSV decoding.

use super::{CellValue, FileFormat, ImportError, ImportResult, ParsedTable, RawRow};
use csv::{ReaderBuilder, StringRecord, Trim};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub(super) fn parse(bytes: &[u8]) -> ImportResult<ParsedTable> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(parse_error)?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(parse_error)?;
        if is_blank(&record) {
            continue;
        }
        // Short lines omit trailing keys; surplus cells have no header and are dropped.
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| (header.clone(), CellValue::Text(value.to_string())))
            .collect();
        rows.push(row);
    }

    Ok(ParsedTable { headers, rows })
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|field| field.trim().is_empty())
}

fn parse_error(err: csv::Error) -> ImportError {
    ImportError::Parse {
        format: FileFormat::Delimited,
        message: err.to_string(),
    }
}
