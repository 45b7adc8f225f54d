//! Public, unauthenticated form page.

use axum::{
    Router,
    extract::{Path, State},
    http::HeaderMap,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::form_response::{AnswerMap, FormResponse};
use services::services::{
    submission::{PublicFormView, SubmissionService},
    submission_guard::DeviceStorage,
};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{DeploymentImpl, error::ApiError};

/// GET /api/submit/{form_id}
pub async fn open_form(
    State(deployment): State<DeploymentImpl>,
    Path(form_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<ResponseJson<ApiResponse<PublicFormView>>, ApiError> {
    let storage = deployment.device_storage(&headers);
    let view = SubmissionService::new(deployment.db().pool.clone())
        .open(form_id, storage.as_ref().map(|s| s as &dyn DeviceStorage))
        .await?;
    Ok(ResponseJson(ApiResponse::success(view)))
}

/// POST /api/submit/{form_id}
pub async fn submit_form(
    State(deployment): State<DeploymentImpl>,
    Path(form_id): Path<Uuid>,
    headers: HeaderMap,
    axum::Json(answers): axum::Json<AnswerMap>,
) -> Result<ResponseJson<ApiResponse<FormResponse>>, ApiError> {
    let storage = deployment.device_storage(&headers);
    let response = SubmissionService::new(deployment.db().pool.clone())
        .submit(
            form_id,
            answers,
            storage.as_ref().map(|s| s as &dyn DeviceStorage),
        )
        .await?;
    Ok(ResponseJson(ApiResponse::success(response)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().route("/submit/{form_id}", get(open_form).post(submit_form))
}
