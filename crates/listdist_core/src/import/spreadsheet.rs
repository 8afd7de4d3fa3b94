//! XLSX/XLS decoding via calamine.
//!
//! Only the first worksheet is read. The first row with any non-empty cell is
//! the header; columns with an empty header cell are ignored.

use super::{CellValue, FileFormat, ImportError, ImportResult, ParsedTable, RawRow};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;

pub(super) fn parse(bytes: &[u8]) -> ImportResult<ParsedTable> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).map_err(parse_error)?;

    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(parse_error)?,
        None => return Ok(ParsedTable::default()),
    };

    let mut sheet_rows = range.rows().skip_while(|cells| is_blank(cells));
    let header_cells = match sheet_rows.next() {
        Some(cells) => cells,
        None => return Ok(ParsedTable::default()),
    };

    let columns: Vec<Option<String>> = header_cells
        .iter()
        .map(|cell| {
            convert_cell(cell)
                .map(|value| value.to_text().trim().to_string())
                .filter(|name| !name.is_empty())
        })
        .collect();
    let headers = columns.iter().flatten().cloned().collect();

    let mut rows = Vec::new();
    for cells in sheet_rows {
        if is_blank(cells) {
            continue;
        }
        let row: RawRow = columns
            .iter()
            .zip(cells.iter())
            .filter_map(|(column, cell)| {
                let name = column.as_ref()?;
                convert_cell(cell).map(|value| (name.clone(), value))
            })
            .collect();
        rows.push(row);
    }

    Ok(ParsedTable { headers, rows })
}

/// Maps a worksheet cell to a loosely-typed value; `None` for empty cells.
fn convert_cell(cell: &Data) -> Option<CellValue> {
    match cell {
        Data::Empty => None,
        Data::String(value) => Some(CellValue::Text(value.clone())),
        Data::Int(value) => Some(CellValue::Number(*value as f64)),
        Data::Float(value) => Some(CellValue::Number(*value)),
        Data::Bool(value) => Some(CellValue::Bool(*value)),
        // Dates stay as Excel serial numbers.
        Data::DateTime(value) => Some(CellValue::Number(value.as_f64())),
        Data::DateTimeIso(value) | Data::DurationIso(value) => {
            Some(CellValue::Text(value.clone()))
        }
        Data::Error(err) => Some(CellValue::Text(err.to_string())),
    }
}

fn is_blank(cells: &[Data]) -> bool {
    cells.iter().all(|cell| match cell {
        Data::Empty => true,
        Data::String(value) => value.trim().is_empty(),
        _ => false,
    })
}

fn parse_error(err: impl std::fmt::Display) -> ImportError {
    ImportError::Parse {
        format: FileFormat::Spreadsheet,
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::parse;

    #[test]
    fn non_spreadsheet_bytes_are_a_parse_error() {
        let err = parse(b"FirstName,Phone\nAna,555\n").unwrap_err();
        assert!(err.to_string().contains("spreadsheet"));
    }
}
