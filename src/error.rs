use crate::domain::card::FieldErrors;
use crate::domain::terminal::TerminalStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PilotError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Card rejected: {0}")]
    CardRejected(FieldErrors),
    #[error("Terminal is {actual}, expected {expected}")]
    InvalidState {
        actual: TerminalStatus,
        expected: TerminalStatus,
    },
    #[error("Recurring invoice not found: {0}")]
    InvoiceNotFound(String),
    #[error("Date out of range: {0}")]
    DateOutOfRange(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, PilotError>;
