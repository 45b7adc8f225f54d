use axum::{
    Router,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::event::{CreateEvent, Event};
use serde::{Deserialize, Serialize};
use services::services::attendance::{AttendanceService, CheckIn, CheckInReceipt};
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{DeploymentImpl, error::ApiError};

/// An event together with the URL its QR code should encode.
#[derive(Debug, Serialize, TS)]
pub struct EventWithLink {
    #[serde(flatten)]
    pub event: Event,
    pub check_in_url: String,
}

#[derive(Debug, Deserialize, TS)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct AttendQuery {
    pub event: Option<String>,
}

fn attendance_service(deployment: &DeploymentImpl) -> AttendanceService {
    AttendanceService::new(deployment.db().pool.clone())
}

fn with_link(deployment: &DeploymentImpl, event: Event) -> EventWithLink {
    let check_in_url =
        attendance_service(deployment).check_in_url(&deployment.config().public_base_url, &event);
    EventWithLink {
        event,
        check_in_url,
    }
}

/// GET /api/events
pub async fn list_events(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<EventWithLink>>>, ApiError> {
    let events = attendance_service(&deployment)
        .list_events()
        .await?
        .into_iter()
        .map(|e| with_link(&deployment, e))
        .collect();
    Ok(ResponseJson(ApiResponse::success(events)))
}

/// POST /api/events
pub async fn create_event(
    State(deployment): State<DeploymentImpl>,
    axum::Json(payload): axum::Json<CreateEvent>,
) -> Result<ResponseJson<ApiResponse<EventWithLink>>, ApiError> {
    if payload.event_name.trim().is_empty() {
        return Err(ApiError::BadRequest("Event name is required".to_string()));
    }
    let event = attendance_service(&deployment).create_event(&payload).await?;
    Ok(ResponseJson(ApiResponse::success(with_link(&deployment, event))))
}

/// POST /api/events/{event_id}/active
pub async fn set_event_active(
    State(deployment): State<DeploymentImpl>,
    Path(event_id): Path<Uuid>,
    axum::Json(payload): axum::Json<SetActiveRequest>,
) -> Result<ResponseJson<ApiResponse<EventWithLink>>, ApiError> {
    let event = attendance_service(&deployment)
        .set_event_active(event_id, payload.is_active)
        .await?;
    Ok(ResponseJson(ApiResponse::success(with_link(&deployment, event))))
}

/// POST /api/attend?event={token}
pub async fn check_in(
    State(deployment): State<DeploymentImpl>,
    Query(query): Query<AttendQuery>,
    axum::Json(payload): axum::Json<CheckIn>,
) -> Result<ResponseJson<ApiResponse<CheckInReceipt>>, ApiError> {
    let receipt = attendance_service(&deployment)
        .check_in(query.event.as_deref(), payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(receipt)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route("/events/{event_id}/active", post(set_event_active))
        .route("/attend", post(check_in))
}
