use thiserror::Error;

/// Text understanding errors
#[derive(Error, Debug)]
pub enum TextError {
    #[error("Invalid parser option: {0}")]
    InvalidOption(String),

    #[error(transparent)]
    TimeError(#[from] kunai_time::error::TimeError),

    #[error(transparent)]
    CoreError(#[from] kunai_core::error::CoreError),
}

pub type TextResult<T> = std::result::Result<T, TextError>;
