use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderMap, HeaderName},
};
use db::DBService;
use services::services::submission_guard::{DeviceRegistry, RegisteredDevice};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod error;
pub mod routes;

use config::ServerConfig;

/// Header carrying the client's device identifier for the submission guard.
pub static DEVICE_ID_HEADER: HeaderName = HeaderName::from_static("x-device-id");

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct DeploymentImpl {
    db: DBService,
    config: Arc<ServerConfig>,
    devices: DeviceRegistry,
}

impl DeploymentImpl {
    pub fn new(db: DBService, config: ServerConfig) -> Self {
        Self {
            db,
            config: Arc::new(config),
            devices: DeviceRegistry::new(),
        }
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Storage of the requesting device, when it identified itself.
    pub fn device_storage(&self, headers: &HeaderMap) -> Option<RegisteredDevice> {
        headers
            .get(&DEVICE_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| self.devices.device(id))
    }
}

pub fn build_router(deployment: DeploymentImpl) -> Router {
    routes::router(&deployment)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(deployment)
}
