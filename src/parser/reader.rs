//! Reading spreadsheet files into a 2-D grid of cell strings

use crate::error::{Result, TerritoryError};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

/// Read the first sheet of a CSV or Excel file; the first row is the header
pub fn read_cells(path: &Path) -> Result<Vec<Vec<String>>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "csv" | "txt" | "tsv" => {
            let bytes = std::fs::read(path)?;
            read_csv_str(&decode_text(&bytes)?)
        }
        "xlsx" | "xlsm" | "xls" | "ods" => read_workbook(path),
        _ => Err(TerritoryError::UnsupportedFormat(ext)),
    }
}

/// UTF-8 text with stray bad bytes replaced. A file where more than one
/// character in twenty is undecodable (a Windows-1251 export, say) is an
/// encoding error rather than garbled headers.
pub(crate) fn decode_text(bytes: &[u8]) -> Result<String> {
    let text = String::from_utf8_lossy(bytes);
    let total = text.chars().count();
    let bad = text.chars().filter(|&c| c == char::REPLACEMENT_CHARACTER).count();
    if bad > 0 && bad * 20 > total {
        return Err(TerritoryError::Encoding(format!(
            "{} of {} characters could not be decoded",
            bad, total
        )));
    }
    Ok(text.into_owned())
}

/// Parse CSV text, guessing the delimiter from the header line
pub fn read_csv_str(content: &str) -> Result<Vec<Vec<String>>> {
    let content = content.trim_start_matches('\u{feff}');
    let header_line = content.lines().next().unwrap_or("");
    let delimiter = detect_delimiter(header_line);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut cells = Vec::new();
    for result in reader.records() {
        let record = result?;
        cells.push(record.iter().map(|s| s.trim().to_string()).collect());
    }
    Ok(cells)
}

fn detect_delimiter(header_line: &str) -> u8 {
    [b';', b',', b'\t']
        .into_iter()
        .max_by_key(|d| header_line.bytes().filter(|b| b == d).count())
        .filter(|d| header_line.as_bytes().contains(d))
        .unwrap_or(b',')
}

fn read_workbook(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(TerritoryError::EmptyInput)??;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect())
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        // Excel serial day number; the row parser understands it as a date
        Data::DateTime(dt) => dt.as_f64().to_string(),
    }
}
