use thiserror::Error;

#[derive(Error, Debug)]
pub enum TerritoryError {
    #[error("Input file is empty or has no data rows")]
    EmptyInput,

    #[error("Missing required columns: {}", fields.join(", "))]
    MissingColumns { fields: Vec<String> },

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("File is not UTF-8 text ({0}); re-save it as CSV UTF-8")]
    Encoding(String),

    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Sheets error: {0}")]
    Sheets(String),

    #[error("Worker error: {0}")]
    Worker(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Excel error: {0}")]
    Excel(#[from] rust_xlsxwriter::XlsxError),
}

impl TerritoryError {
    /// Whether a failed HTTP call is worth retrying (429, 5xx, connection failures)
    pub fn is_transient(&self) -> bool {
        match self {
            TerritoryError::Http { status, .. } => *status == 429 || *status >= 500,
            TerritoryError::Transport(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, TerritoryError>;
