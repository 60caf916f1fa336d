mod health;
mod meetings;
mod schedule;
mod timezone;

use salvo::{Request, Router};
use serde::de::DeserializeOwned;

use crate::error::{AppError, AppResult};
use crate::middleware::user::UserMiddleware;

// Re-export route constants from core
pub use kunai_core::constants::{
    API_ROUTE_COMPONENT, API_ROUTE_PREFIX, MEETINGS_ROUTE_COMPONENT, MEETINGS_ROUTE_PREFIX,
    SCHEDULE_ROUTE_COMPONENT, SCHEDULE_ROUTE_PREFIX,
};

/// ## Summary
/// Constructs the API router. Everything except the health check requires
/// the user header.
#[must_use]
pub fn routes() -> Router {
    Router::with_path(API_ROUTE_COMPONENT)
        .push(health::routes())
        .push(
            Router::new()
                .hoop(UserMiddleware)
                .push(schedule::routes())
                .push(meetings::routes())
                .push(timezone::routes()),
        )
}

/// Reads a JSON request body, answering 400 when it does not fit `T`.
async fn json_body<T: DeserializeOwned>(req: &mut Request) -> AppResult<T> {
    req.parse_json::<T>().await.map_err(|e| {
        tracing::debug!(error = %e, "Unreadable request body");
        AppError::BadRequest(format!("invalid request body: {e}"))
    })
}
