use kunai_service::error::ServiceError;
use salvo::http::StatusCode;
use salvo::writing::Json;
use salvo::{Depot, Request, Response, Writer, async_trait};
use serde::Serialize;
use thiserror::Error;

/// Application-level errors (HTTP layer)
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    ServiceError(#[from] ServiceError),

    #[error(transparent)]
    CoreError(#[from] kunai_core::error::CoreError),

    #[error("Missing {} header", kunai_core::constants::USER_HEADER)]
    Unauthenticated,

    #[error("Bad request: {0}")]
    BadRequest(String),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

/// ## Summary
/// Error response payload
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl AppError {
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::CoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceError(e) => match e {
                ServiceError::ParseAmbiguous(_) => StatusCode::CONFLICT,
                ServiceError::ParseFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
                ServiceError::InvalidOperation(_)
                | ServiceError::TimeError(_)
                | ServiceError::TextError(_) => StatusCode::BAD_REQUEST,
                ServiceError::NotOwner(_) => StatusCode::FORBIDDEN,
                ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
                ServiceError::CoreError(_)
                | ServiceError::InvariantViolation(_)
                | ServiceError::HttpError(_)
                | ServiceError::IoError(_)
                | ServiceError::JsonError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

#[async_trait]
impl Writer for AppError {
    async fn write(self, _req: &mut Request, _depot: &mut Depot, res: &mut Response) {
        let status = self.status_code();
        let error = if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            tracing::debug!(error = %self, %status, "Request rejected");
            self.to_string()
        };
        res.status_code(status);
        res.render(Json(ErrorResponse { error }));
    }
}
