use thiserror::Error;

/// Timezone and recurrence errors
#[derive(Error, Debug)]
pub enum TimeError {
    /// Unknown or invalid timezone identifier.
    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    /// Local time that cannot be placed on the timeline.
    #[error("Non-existent time: {0}")]
    NonExistentTime(String),

    #[error("Invalid recurrence rule: {0}")]
    InvalidRule(String),

    #[error(transparent)]
    CoreError(#[from] kunai_core::error::CoreError),
}

pub type TimeResult<T> = std::result::Result<T, TimeError>;
