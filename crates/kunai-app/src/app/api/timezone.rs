use kunai_service::depot::get_context_from_depot;
use salvo::writing::Json;
use salvo::{Depot, Request, Router, handler};
use serde::{Deserialize, Serialize};

use super::json_body;
use crate::error::AppResult;
use crate::middleware::user::current_user;

#[derive(Debug, Deserialize, Serialize)]
pub struct TimezoneBody {
    pub timezone: String,
}

/// ## Summary
/// PUT /api/timezone - Stores the user's timezone, answering with its canonical name
///
/// ## Errors
/// Returns HTTP 400 for an unknown timezone.
#[handler]
async fn set_timezone(req: &mut Request, depot: &mut Depot) -> AppResult<Json<TimezoneBody>> {
    let user = current_user(depot)?;
    let body: TimezoneBody = json_body(req).await?;
    let context = get_context_from_depot(depot)?;

    let timezone = context.set_timezone(&user, &body.timezone)?;
    Ok(Json(TimezoneBody { timezone }))
}

/// GET /api/timezone - The timezone requests are read in
#[handler]
async fn get_timezone(depot: &mut Depot) -> AppResult<Json<TimezoneBody>> {
    let user = current_user(depot)?;
    let context = get_context_from_depot(depot)?;
    Ok(Json(TimezoneBody {
        timezone: context.timezone_of(&user)?.name().to_string(),
    }))
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("timezone").get(get_timezone).put(set_timezone)
}
