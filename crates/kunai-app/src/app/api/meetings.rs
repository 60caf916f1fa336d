use chrono::NaiveDate;
use kunai_core::types::MeetingId;
use kunai_service::command::{ManageAction, ManageOutcome, MeetingView};
use kunai_service::depot::get_context_from_depot;
use kunai_service::registry::ClearRequest;
use salvo::writing::Json;
use salvo::{Depot, Request, Router, handler};
use serde::{Deserialize, Serialize};

use super::schedule::TokenRequest;
use super::{MEETINGS_ROUTE_COMPONENT, json_body};
use crate::error::{AppError, AppResult};
use crate::middleware::user::current_user;

#[derive(Debug, Deserialize)]
pub struct ManageRequest {
    #[serde(flatten)]
    pub action: ManageAction,
    /// Natural local date of the occurrence; the next one when absent.
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct ClearedResponse {
    pub deleted: usize,
}

/// ## Summary
/// GET /api/meetings - The user's meetings, soonest first
///
/// ## Errors
/// Returns HTTP 500 if the registry is unavailable.
#[handler]
async fn list(depot: &mut Depot) -> AppResult<Json<Vec<MeetingView>>> {
    let user = current_user(depot)?;
    let context = get_context_from_depot(depot)?;
    Ok(Json(context.list(&user)?))
}

/// ## Summary
/// POST /api/meetings/{id}/manage - Cancels or moves an occurrence or a whole meeting
///
/// ## Errors
/// Returns HTTP 400 for a malformed id or an instance action on a one-off
/// meeting, 403 for someone else's meeting, 404 for unknown meetings or
/// occurrences, 422 when the new time cannot be read.
#[handler]
async fn manage(req: &mut Request, depot: &mut Depot) -> AppResult<Json<ManageOutcome>> {
    let user = current_user(depot)?;
    let id: MeetingId = req
        .param::<String>("id")
        .ok_or_else(|| AppError::BadRequest("missing meeting id".to_string()))?
        .parse()
        .map_err(|e| AppError::BadRequest(format!("invalid meeting id: {e}")))?;
    let body: ManageRequest = json_body(req).await?;
    let context = get_context_from_depot(depot)?;

    Ok(Json(context.manage(&user, id, &body.action, body.date)?))
}

/// ## Summary
/// POST /api/meetings/clear - Asks to delete all of the user's meetings
///
/// Nothing is deleted until the returned token is confirmed.
///
/// ## Errors
/// Returns HTTP 500 if the registry is unavailable.
#[handler]
async fn clear(depot: &mut Depot) -> AppResult<Json<ClearRequest>> {
    let user = current_user(depot)?;
    let context = get_context_from_depot(depot)?;
    Ok(Json(context.clear_all(&user)?))
}

/// ## Summary
/// POST /api/meetings/clear/confirm - Deletes all of the user's meetings
///
/// ## Errors
/// Returns HTTP 400 if the token is missing, wrong or expired.
#[handler]
async fn confirm_clear(req: &mut Request, depot: &mut Depot) -> AppResult<Json<ClearedResponse>> {
    let user = current_user(depot)?;
    let body: TokenRequest = json_body(req).await?;
    let context = get_context_from_depot(depot)?;

    let deleted = context.confirm_clear_all(&user, body.token)?;
    Ok(Json(ClearedResponse { deleted }))
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(MEETINGS_ROUTE_COMPONENT)
        .get(list)
        .push(
            Router::with_path("clear")
                .post(clear)
                .push(Router::with_path("confirm").post(confirm_clear)),
        )
        .push(Router::with_path("{id}/manage").post(manage))
}
