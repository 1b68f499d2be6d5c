use crate::record::RecordStatus;
use thiserror::Error;

pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Donation record not found: {0}")]
    NotFound(String),

    #[error("Duplicate donation record: {0}")]
    Duplicate(String),

    #[error("Amount overflow: {0}")]
    Overflow(String),

    #[error("Cannot move donation {id} from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: RecordStatus,
        to: RecordStatus,
    },
}
