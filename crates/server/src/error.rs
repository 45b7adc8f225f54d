use axum::{
    Json,
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::services::{
    attendance::{CheckInError, FieldIssue},
    forms::FormServiceError,
    responses::ResponseServiceError,
    submission::SubmissionError,
};
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Form(#[from] FormServiceError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    Response(#[from] ResponseServiceError),
    #[error(transparent)]
    CheckIn(#[from] CheckInError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Query(#[from] QueryRejection),
    #[error("{0}")]
    BadRequest(String),
}

/// Structured details sent in `error_data`.
#[derive(Debug, serde::Serialize)]
#[serde(untagged)]
enum ErrorDetail {
    MissingFields(Vec<String>),
    Issues(Vec<FieldIssue>),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Form(e) => match e {
                FormServiceError::NotFound => StatusCode::NOT_FOUND,
                FormServiceError::Schema(_) | FormServiceError::MissingTitle => {
                    StatusCode::BAD_REQUEST
                }
                FormServiceError::SchemaLocked { .. }
                | FormServiceError::InvalidTransition { .. } => StatusCode::CONFLICT,
                FormServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Submission(e) => match e {
                SubmissionError::NotAvailable => StatusCode::NOT_FOUND,
                SubmissionError::AlreadySubmitted => StatusCode::CONFLICT,
                SubmissionError::MissingRequired(_) => StatusCode::BAD_REQUEST,
                SubmissionError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Response(e) => match e {
                ResponseServiceError::FormNotFound => StatusCode::NOT_FOUND,
                ResponseServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::CheckIn(e) => match e {
                CheckInError::NotFound => StatusCode::NOT_FOUND,
                CheckInError::Invalid(_) | CheckInError::InvalidEvent => StatusCode::BAD_REQUEST,
                CheckInError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) | ApiError::Query(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn detail(&self) -> Option<ErrorDetail> {
        match self {
            ApiError::Submission(SubmissionError::MissingRequired(ids)) => {
                Some(ErrorDetail::MissingFields(ids.clone()))
            }
            ApiError::CheckIn(CheckInError::Invalid(issues)) => {
                Some(ErrorDetail::Issues(issues.clone()))
            }
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = match self.detail() {
            Some(detail) => ApiResponse::<(), ErrorDetail>::error_with_data(&message, detail),
            None => ApiResponse::<(), ErrorDetail>::error(&message),
        };
        (status, Json(body)).into_response()
    }
}
