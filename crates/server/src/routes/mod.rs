use axum::Router;

use crate::DeploymentImpl;

pub mod events;
pub mod forms;
pub mod health;
pub mod submit;

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let api = Router::new()
        .merge(health::router(deployment))
        .merge(forms::router(deployment))
        .merge(submit::router(deployment))
        .merge(events::router(deployment));

    Router::new().nest("/api", api)
}
