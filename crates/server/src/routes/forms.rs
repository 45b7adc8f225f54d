use axum::{
    Router,
    extract::{Path, Query, State, rejection::QueryRejection},
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use db::models::{
    form::{CreateForm, Form, FormStatus, UpdateForm},
    form_response::FormResponse,
    form_schema::FormSchema,
};
use serde::Deserialize;
use services::services::{
    forms::{FormFilter, FormService, ShareLink},
    response_aggregator::FieldFrequency,
    responses::ResponseService,
};
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{DeploymentImpl, error::ApiError};

#[derive(Debug, Deserialize, TS)]
pub struct SetStatusRequest {
    pub status: FormStatus,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

fn form_service(deployment: &DeploymentImpl) -> FormService {
    FormService::new(deployment.db().pool.clone())
}

fn response_service(deployment: &DeploymentImpl) -> ResponseService {
    ResponseService::new(deployment.db().pool.clone())
}

/// GET /api/forms?status=&search=
pub async fn list_forms(
    State(deployment): State<DeploymentImpl>,
    filter: Result<Query<FormFilter>, QueryRejection>,
) -> Result<ResponseJson<ApiResponse<Vec<Form>>>, ApiError> {
    let Query(filter) = filter?;
    let forms = form_service(&deployment).list(&filter).await?;
    Ok(ResponseJson(ApiResponse::success(forms)))
}

/// POST /api/forms
pub async fn create_form(
    State(deployment): State<DeploymentImpl>,
    axum::Json(payload): axum::Json<CreateForm>,
) -> Result<ResponseJson<ApiResponse<Form>>, ApiError> {
    let form = form_service(&deployment).create(payload).await?;
    Ok(ResponseJson(ApiResponse::success(form)))
}

/// GET /api/forms/{form_id}
pub async fn get_form(
    State(deployment): State<DeploymentImpl>,
    Path(form_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Form>>, ApiError> {
    let form = form_service(&deployment).get(form_id).await?;
    Ok(ResponseJson(ApiResponse::success(form)))
}

/// PUT /api/forms/{form_id}
pub async fn update_form(
    State(deployment): State<DeploymentImpl>,
    Path(form_id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdateForm>,
) -> Result<ResponseJson<ApiResponse<Form>>, ApiError> {
    let form = form_service(&deployment)
        .update_details(form_id, payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(form)))
}

/// DELETE /api/forms/{form_id}
/// Removes the form together with its responses
pub async fn delete_form(
    State(deployment): State<DeploymentImpl>,
    Path(form_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    form_service(&deployment).delete(form_id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

/// PUT /api/forms/{form_id}/schema
pub async fn update_schema(
    State(deployment): State<DeploymentImpl>,
    Path(form_id): Path<Uuid>,
    axum::Json(schema): axum::Json<FormSchema>,
) -> Result<ResponseJson<ApiResponse<Form>>, ApiError> {
    let form = form_service(&deployment)
        .update_schema(form_id, schema)
        .await?;
    Ok(ResponseJson(ApiResponse::success(form)))
}

/// POST /api/forms/{form_id}/status
pub async fn set_status(
    State(deployment): State<DeploymentImpl>,
    Path(form_id): Path<Uuid>,
    axum::Json(payload): axum::Json<SetStatusRequest>,
) -> Result<ResponseJson<ApiResponse<Form>>, ApiError> {
    let form = form_service(&deployment)
        .set_status(form_id, payload.status)
        .await?;
    Ok(ResponseJson(ApiResponse::success(form)))
}

/// GET /api/forms/{form_id}/share
pub async fn share_link(
    State(deployment): State<DeploymentImpl>,
    Path(form_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<ShareLink>>, ApiError> {
    let link = form_service(&deployment)
        .share_link(form_id, &deployment.config().public_base_url)
        .await?;
    Ok(ResponseJson(ApiResponse::success(link)))
}

/// GET /api/forms/{form_id}/responses?search=
pub async fn list_responses(
    State(deployment): State<DeploymentImpl>,
    Path(form_id): Path<Uuid>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<ResponseJson<ApiResponse<Vec<FormResponse>>>, ApiError> {
    let Query(query) = query?;
    let responses = response_service(&deployment)
        .list(form_id, query.search.as_deref())
        .await?;
    Ok(ResponseJson(ApiResponse::success(responses)))
}

/// DELETE /api/forms/{form_id}/responses
/// Returns how many responses were removed
pub async fn purge_responses(
    State(deployment): State<DeploymentImpl>,
    Path(form_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<u64>>, ApiError> {
    let removed = response_service(&deployment).purge(form_id).await?;
    Ok(ResponseJson(ApiResponse::success(removed)))
}

/// GET /api/forms/{form_id}/analytics
pub async fn analytics(
    State(deployment): State<DeploymentImpl>,
    Path(form_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<FieldFrequency>>>, ApiError> {
    let tables = response_service(&deployment).analytics(form_id).await?;
    Ok(ResponseJson(ApiResponse::success(tables)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new()
        .route("/forms", get(list_forms).post(create_form))
        .route(
            "/forms/{form_id}",
            get(get_form).put(update_form).delete(delete_form),
        )
        .route("/forms/{form_id}/schema", put(update_schema))
        .route("/forms/{form_id}/status", post(set_status))
        .route("/forms/{form_id}/share", get(share_link))
        .route(
            "/forms/{form_id}/responses",
            get(list_responses).delete(purge_responses),
        )
        .route("/forms/{form_id}/analytics", get(analytics))
}
