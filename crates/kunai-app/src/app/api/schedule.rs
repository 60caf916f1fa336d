use kunai_service::command::{MeetingView, ScheduleOutcome};
use kunai_service::depot::get_context_from_depot;
use salvo::http::StatusCode;
use salvo::writing::Json;
use salvo::{Depot, Request, Response, Router, handler};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{SCHEDULE_ROUTE_COMPONENT, json_body};
use crate::error::AppResult;
use crate::middleware::user::current_user;

#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    pub text: String,
    /// Overrides the user's stored timezone for this request only.
    pub timezone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub token: Uuid,
}

#[derive(Debug, Serialize)]
pub struct RejectResponse {
    pub rejected: usize,
}

/// ## Summary
/// POST /api/schedule - Parses a request and stores or holds its meetings
///
/// ## Errors
/// Returns HTTP 201 when meetings were stored, 202 when drafts await
/// confirmation, 422 when nothing could be read, 400 for an unknown timezone.
#[handler]
async fn schedule(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<Json<ScheduleOutcome>> {
    let user = current_user(depot)?;
    let body: ScheduleRequest = json_body(req).await?;
    let context = get_context_from_depot(depot)?;

    let outcome = context.schedule(&user, &body.text, body.timezone.as_deref())?;
    res.status_code(match outcome {
        ScheduleOutcome::Created { .. } => StatusCode::CREATED,
        ScheduleOutcome::NeedsConfirmation { .. } => StatusCode::ACCEPTED,
        ScheduleOutcome::Failed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    });
    Ok(Json(outcome))
}

/// ## Summary
/// POST /api/schedule/confirm - Stores drafts held for confirmation
///
/// ## Errors
/// Returns HTTP 404 for an unknown token and 400 for expired or foreign drafts.
#[handler]
async fn confirm(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<Json<Vec<MeetingView>>> {
    let user = current_user(depot)?;
    let body: TokenRequest = json_body(req).await?;
    let context = get_context_from_depot(depot)?;

    let meetings = context.confirm(&user, body.token)?;
    res.status_code(StatusCode::CREATED);
    Ok(Json(meetings))
}

/// ## Summary
/// POST /api/schedule/reject - Discards drafts held for confirmation
///
/// ## Errors
/// Returns HTTP 404 for an unknown token and 400 for expired or foreign drafts.
#[handler]
async fn reject(req: &mut Request, depot: &mut Depot) -> AppResult<Json<RejectResponse>> {
    let user = current_user(depot)?;
    let body: TokenRequest = json_body(req).await?;
    let context = get_context_from_depot(depot)?;

    let rejected = context.reject(&user, body.token)?;
    Ok(Json(RejectResponse { rejected }))
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(SCHEDULE_ROUTE_COMPONENT)
        .post(schedule)
        .push(Router::with_path("confirm").post(confirm))
        .push(Router::with_path("reject").post(reject))
}
