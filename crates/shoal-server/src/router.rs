use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use shoal_protocol::endpoint::endpoints;

use crate::handler;
use crate::service::EntityService;

/// Build the axum router with all Shoal endpoints.
pub fn build_router(service: Arc<EntityService>) -> Router {
    Router::new()
        .route(endpoints::HEALTH, get(handler::health_handler))
        .route(endpoints::INFO, get(handler::info_handler))
        .route(endpoints::MESSAGE, post(handler::message_handler))
        .with_state(service)
}
