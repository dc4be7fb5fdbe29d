use chrono::NaiveTime;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid filter provided: {0}")]
    InvalidFilter(String),

    #[error("Quote {id} read back from the database does not match the written quote")]
    IntegrityMismatch { id: i64 },

    #[error("Start time {start} must be less than or equal to end time {end}")]
    WindowInvalid { start: NaiveTime, end: NaiveTime },

    #[error("Spacing between notifications must be at least one minute, got {0}")]
    InvalidSpacing(i64),

    #[error("Quote {0} not found")]
    NotFound(i64),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::StorageUnavailable(err.to_string())
    }
}

impl From<tokio_rusqlite::Error> for AppError {
    fn from(err: tokio_rusqlite::Error) -> Self {
        AppError::StorageUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
