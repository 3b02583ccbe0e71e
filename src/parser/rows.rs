//! Typed sales rows from a cell grid

use super::columns::ColumnMap;
use crate::error::{Result, TerritoryError};
use crate::model::RawRow;
use chrono::{Days, NaiveDate};

/// Manager value used when the manager cell of a row is blank
pub const UNKNOWN_MANAGER: &str = "Без менеджера";

/// Rows accepted from a sheet plus what was dropped
#[derive(Debug, Clone)]
pub struct ParsedRows {
    pub rows: Vec<RawRow>,
    pub columns: ColumnMap,
    /// Rows whose volume was missing, unparseable or not positive
    pub dropped: usize,
}

/// Parse a grid whose first row is the header.
///
/// Missing required columns and empty input are errors; bad volumes are not,
/// those rows are only counted in [`ParsedRows::dropped`].
pub fn parse_rows(cells: &[Vec<String>]) -> Result<ParsedRows> {
    let (header, data) = cells.split_first().ok_or(TerritoryError::EmptyInput)?;
    if header.iter().all(|h| h.trim().is_empty()) {
        return Err(TerritoryError::EmptyInput);
    }
    let columns = ColumnMap::resolve(header)?;

    let mut rows = Vec::new();
    let mut dropped = 0;
    let mut data_rows = 0;

    for (idx, record) in data.iter().enumerate() {
        if record.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        data_rows += 1;
        let line_number = idx + 2;
        let cell = |col: usize| record.get(col).map(|s| s.trim()).unwrap_or("");
        let text = |col: Option<usize>| {
            col.map(cell)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };
        let number = |col: Option<usize>| col.and_then(|c| parse_number(cell(c)));

        let volume = match parse_number(cell(columns.volume)) {
            Some(v) if v > 0.0 => v,
            _ => {
                log::debug!("Row {}: dropping volume '{}'", line_number, cell(columns.volume));
                dropped += 1;
                continue;
            }
        };

        let manager = text(Some(columns.manager)).unwrap_or_else(|| UNKNOWN_MANAGER.to_string());

        rows.push(RawRow {
            line_number,
            manager,
            address: text(Some(columns.address)),
            volume,
            brand: text(columns.brand),
            client_name: text(columns.client_name),
            region: text(columns.region),
            date: columns.date.and_then(|c| parse_date(cell(c))),
            lat: number(columns.lat),
            lon: number(columns.lon),
            potential: number(columns.potential).filter(|p| *p > 0.0),
        });
    }

    if data_rows == 0 {
        return Err(TerritoryError::EmptyInput);
    }
    if dropped > 0 {
        log::info!("Dropped {} of {} rows with missing or non-positive volume", dropped, data_rows);
    }

    Ok(ParsedRows {
        rows,
        columns,
        dropped,
    })
}

/// Lenient number parsing: whitespace (including non-breaking) removed,
/// comma accepted as the decimal separator
pub fn parse_number(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}' && *c != '\u{202f}')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Dates as written in Russian and ISO spreadsheets, with an optional time
/// part, or an Excel serial day number
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let date_part = text.split(|c| c == ' ' || c == 'T').next().unwrap_or(text);

    // %Y also takes "24", so a two-digit year must go to %y first
    let is_sep = |c: char| c == '.' || c == '/';
    let short_year = date_part.contains(is_sep)
        && date_part
            .rsplit(is_sep)
            .next()
            .map_or(false, |year| year.len() == 2);
    let formats: &[&str] = if short_year {
        &["%d.%m.%y", "%d/%m/%y"]
    } else {
        &["%d.%m.%Y", "%Y-%m-%d", "%d/%m/%Y"]
    };

    for format in formats {
        if let Ok(date) = NaiveDate::parse_from_str(date_part, format) {
            return Some(date);
        }
    }

    let serial = text.replace(',', ".").parse::<f64>().ok()?;
    if !(20000.0..=80000.0).contains(&serial) {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(serial.floor() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("1 234,5"), Some(1234.5));
        assert_eq!(parse_number("1\u{a0}000"), Some(1000.0));
        assert_eq!(parse_number("-3.5"), Some(-3.5));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn test_parse_date() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(parse_date("15.03.2024"), Some(d));
        assert_eq!(parse_date("2024-03-15"), Some(d));
        assert_eq!(parse_date("2024-03-15T10:00:00"), Some(d));
        assert_eq!(parse_date("15/03/2024"), Some(d));
        assert_eq!(parse_date("15.03.24"), Some(d));
        assert_eq!(parse_date("15/03/24"), Some(d));
        assert_eq!(parse_date("15.03.24 10:00"), Some(d));
        assert_eq!(parse_date("45366"), Some(d));
        assert_eq!(parse_date("вчера"), None);
    }

    #[test]
    fn test_rows_with_bad_volume_are_dropped() {
        let cells = grid(&[
            &["Менеджер", "Адрес", "Объем", "Бренд"],
            &["Иванов", "г. Москва, ул. Ленина 1", "100", "Alpha"],
            &["Иванов", "г. Москва, ул. Ленина 2", "0", "Alpha"],
            &["Петров", "г. Казань, ул. Баумана 3", "н/д", "Beta"],
            &["", "", "", ""],
            &["", "г. Казань, ул. Баумана 4", "12,5", ""],
        ]);
        let parsed = parse_rows(&cells).unwrap();
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.dropped, 2);
        assert_eq!(parsed.rows[0].brand.as_deref(), Some("Alpha"));
        assert_eq!(parsed.rows[1].manager, UNKNOWN_MANAGER);
        assert_eq!(parsed.rows[1].volume, 12.5);
        assert_eq!(parsed.rows[1].brand, None);
        assert_eq!(parsed.rows[1].line_number, 6);
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(parse_rows(&[]), Err(TerritoryError::EmptyInput)));
        let header_only = grid(&[&["Менеджер", "Адрес", "Объем"]]);
        assert!(matches!(parse_rows(&header_only), Err(TerritoryError::EmptyInput)));
    }

    #[test]
    fn test_missing_columns_fail_fast() {
        let cells = grid(&[&["Менеджер", "Клиент"], &["Иванов", "ООО Ромашка"]]);
        match parse_rows(&cells) {
            Err(TerritoryError::MissingColumns { fields }) => {
                assert_eq!(fields, vec!["address/region", "volume"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
