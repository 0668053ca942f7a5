use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::response::Json;
use serde_json::json;

use shoal_protocol::HealthResponse;

use crate::service::EntityService;

/// Health check handler.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// Info handler.
pub async fn info_handler(State(service): State<Arc<EntityService>>) -> Json<serde_json::Value> {
    Json(json!({
        "name": "shoal-server",
        "version": env!("CARGO_PKG_VERSION"),
        "protocol_version": shoal_protocol::PROTOCOL_VERSION,
        "stores": service.registry().aliases(),
    }))
}

/// Entity message handler: one request frame in, one response frame out.
pub async fn message_handler(
    State(service): State<Arc<EntityService>>,
    body: Bytes,
) -> Vec<u8> {
    service.handle_frame(&body)
}
