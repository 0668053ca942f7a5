use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::service::{EntityService, StoreRegistry};

/// Shoal store server: the entity service plus its HTTP surface.
pub struct ShoalServer {
    config: ServerConfig,
    service: Arc<EntityService>,
}

impl ShoalServer {
    pub fn new(config: ServerConfig) -> Self {
        let registry = match config.compaction_threshold {
            Some(threshold) => StoreRegistry::with_compaction_threshold(threshold),
            None => StoreRegistry::new(),
        };
        Self {
            config,
            service: Arc::new(EntityService::new(registry)),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The entity service, for in-process clients and tests.
    pub fn service(&self) -> Arc<EntityService> {
        Arc::clone(&self.service)
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.service())
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = build_router(self.service());
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!("shoal server listening on {}", self.config.bind_addr);
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
