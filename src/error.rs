use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Failed to read PDF {path}: {details}")]
    PdfRead { path: String, details: String },

    #[error("Failed to read workbook {path}: {details}")]
    Spreadsheet { path: String, details: String },

    #[error("Sheet '{sheet}' not found in workbook {path}")]
    SheetNotFound { path: String, sheet: String },

    #[error("Invalid tolerance {0}: must be a finite value between 0.0 and 1.0")]
    InvalidTolerance(f64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[cfg(feature = "gemini")]
    #[error("LLM extraction failed: {0}")]
    ExtractionFailed(String),

    #[cfg(feature = "gemini")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
