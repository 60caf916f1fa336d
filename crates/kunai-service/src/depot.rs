use std::sync::Arc;

use salvo::async_trait;

use crate::command::SchedulingContext;
use crate::error::{ServiceError, ServiceResult};

/// Makes the scheduling context available to every handler below it.
pub struct SchedulingContextHandler {
    pub context: Arc<SchedulingContext>,
}

#[async_trait]
impl salvo::Handler for SchedulingContextHandler {
    #[tracing::instrument(skip(self, _req, depot, _res, _ctrl))]
    async fn handle(
        &self,
        _req: &mut salvo::Request,
        depot: &mut salvo::Depot,
        _res: &mut salvo::Response,
        _ctrl: &mut salvo::FlowCtrl,
    ) {
        depot.inject(Arc::clone(&self.context));
    }
}

/// ## Summary
/// Retrieves the scheduling context from the depot.
///
/// ## Errors
/// Returns an error if the context was not injected.
pub fn get_context_from_depot(depot: &salvo::Depot) -> ServiceResult<Arc<SchedulingContext>> {
    depot
        .obtain::<Arc<SchedulingContext>>()
        .cloned()
        .map_err(|_err| ServiceError::InvariantViolation("Scheduling context not found in depot"))
}
