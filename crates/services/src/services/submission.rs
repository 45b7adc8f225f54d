//! Public submission page: open a form for answering and record a response.

use chrono::Utc;
use db::models::{
    form::{Form, FormStatus},
    form_response::{AnswerMap, FormResponse},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{error, info, warn};
use ts_rs::TS;
use uuid::Uuid;

use super::{
    form_renderer::{self, RenderedForm},
    submission_guard::{DeviceStorage, SubmissionGuard},
};

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("form is not available")]
    NotAvailable,
    #[error("a response was already submitted from this device")]
    AlreadySubmitted,
    #[error("required fields are empty: {}", .0.join(", "))]
    MissingRequired(Vec<String>),
}

/// What the public page shows for a form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PublicFormView {
    NotAvailable,
    AlreadySubmitted {
        title: String,
    },
    Open {
        form: Box<Form>,
        rendered: RenderedForm,
        answers: AnswerMap,
    },
}

pub struct SubmissionService {
    pool: SqlitePool,
}

impl SubmissionService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn find_active(&self, form_id: Uuid) -> Result<Option<Form>, sqlx::Error> {
        Ok(Form::find_by_id(&self.pool, form_id)
            .await?
            .filter(|f| f.status == FormStatus::Active))
    }

    pub async fn open(
        &self,
        form_id: Uuid,
        storage: Option<&dyn DeviceStorage>,
    ) -> Result<PublicFormView, SubmissionError> {
        let Some(form) = self.find_active(form_id).await? else {
            return Ok(PublicFormView::NotAvailable);
        };

        if !form.allow_multiple_submissions
            && storage.is_some_and(|s| SubmissionGuard::new(s).has_submitted(form_id))
        {
            return Ok(PublicFormView::AlreadySubmitted { title: form.title });
        }

        let rendered = form_renderer::render(&form.form_schema);
        let answers = rendered.initial_answers();
        Ok(PublicFormView::Open {
            form: Box::new(form),
            rendered,
            answers,
        })
    }

    /// Record one response. The answers are stored as given, on top of the
    /// initial value of every rendered field; nothing is coerced.
    pub async fn submit(
        &self,
        form_id: Uuid,
        answers: AnswerMap,
        storage: Option<&dyn DeviceStorage>,
    ) -> Result<FormResponse, SubmissionError> {
        let form = self
            .find_active(form_id)
            .await?
            .ok_or(SubmissionError::NotAvailable)?;

        let guard = storage.map(SubmissionGuard::new);
        let single_use = !form.allow_multiple_submissions;
        if single_use && guard.as_ref().is_some_and(|g| g.has_submitted(form_id)) {
            info!(form_id = %form_id, "Blocked repeat submission from device");
            return Err(SubmissionError::AlreadySubmitted);
        }

        let rendered = form_renderer::render(&form.form_schema);
        let mut response_data = rendered.initial_answers();
        response_data.extend(answers);

        let missing = rendered.missing_required(&response_data);
        if !missing.is_empty() {
            return Err(SubmissionError::MissingRequired(missing));
        }

        let response =
            FormResponse::create(&self.pool, Uuid::new_v4(), form_id, &response_data, Utc::now())
                .await
                .inspect_err(|e| error!(form_id = %form_id, error = %e, "Failed to store response"))?;

        if let Some(Err(e)) = guard
            .filter(|_| single_use)
            .map(|g| g.mark_submitted(form_id))
        {
            warn!(form_id = %form_id, error = %e, "Could not set device submission flag");
        }

        info!(form_id = %form_id, response_id = %response.id, "Recorded form response");
        Ok(response)
    }
}
