use salvo::writing::Json;
use salvo::{Depot, Router, handler};
use serde::Serialize;

use crate::config::get_config_from_depot;
use crate::error::AppResult;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    reminders_enabled: bool,
}

#[handler]
async fn health(depot: &mut Depot) -> AppResult<Json<HealthResponse>> {
    let config = get_config_from_depot(depot)?;
    Ok(Json(HealthResponse {
        status: "ok",
        reminders_enabled: config.scheduler.enabled,
    }))
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("health").get(health)
}
