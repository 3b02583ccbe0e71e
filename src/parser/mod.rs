pub mod columns;
pub mod reader;
pub mod rows;

pub use columns::{ColumnMap, SemanticField};
pub use reader::{read_cells, read_csv_str};
pub use rows::{parse_date, parse_number, parse_rows, ParsedRows, UNKNOWN_MANAGER};

use crate::error::Result;
use std::path::Path;

/// Read a sales file and map it to typed rows
pub fn parse_file(path: &Path) -> Result<ParsedRows> {
    let cells = read_cells(path)?;
    parse_rows(&cells)
}
