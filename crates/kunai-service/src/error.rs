use thiserror::Error;

/// Service layer errors - combines all error types
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    CoreError(#[from] kunai_core::error::CoreError),

    #[error(transparent)]
    TimeError(#[from] kunai_time::error::TimeError),

    #[error(transparent)]
    TextError(#[from] kunai_text::error::TextError),

    /// A draft needs the user's confirmation before it may be stored.
    #[error("Needs confirmation: {0}")]
    ParseAmbiguous(String),

    #[error("Could not parse: {0}")]
    ParseFailed(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// The actor does not own the meeting.
    #[error("Invalid operation: meeting {0} belongs to another user")]
    NotOwner(kunai_core::types::MeetingId),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(&'static str),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
