use kunai_core::constants::USER_HEADER;
use kunai_core::types::UserId;
use salvo::Depot;
use salvo::http::StatusCode;
use salvo::writing::Json;

use crate::error::{AppError, AppResult, ErrorResponse};

pub mod depot_keys {
    pub const CURRENT_USER: &str = "__current_user";
}

/// ## Summary
/// Reads the chat user id the bot forwards in the `X-Kunai-User` header and
/// stores it in the depot.
///
/// ## Errors
/// Returns an HTTP 401 Unauthorized response if the header is missing or blank.
pub struct UserMiddleware;

#[salvo::async_trait]
impl salvo::Handler for UserMiddleware {
    #[tracing::instrument(skip(self, req, depot, res, ctrl), fields(
        method = %req.method(),
        path = %req.uri().path()
    ))]
    async fn handle(
        &self,
        req: &mut salvo::Request,
        depot: &mut Depot,
        res: &mut salvo::Response,
        ctrl: &mut salvo::FlowCtrl,
    ) {
        let user = req
            .header::<String>(USER_HEADER)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let Some(user) = user else {
            tracing::debug!("Request without user header");
            res.status_code(StatusCode::UNAUTHORIZED);
            res.render(Json(ErrorResponse {
                error: AppError::Unauthenticated.to_string(),
            }));
            ctrl.skip_rest();
            return;
        };

        tracing::trace!(%user, "Request user identified");
        depot.insert(depot_keys::CURRENT_USER, UserId::new(user));
    }
}

/// ## Summary
/// The user set by [`UserMiddleware`].
///
/// ## Errors
/// Returns `AppError::Unauthenticated` if the middleware did not run or found no user.
pub fn current_user(depot: &Depot) -> AppResult<UserId> {
    depot
        .get::<UserId>(depot_keys::CURRENT_USER)
        .cloned()
        .map_err(|_err| AppError::Unauthenticated)
}
