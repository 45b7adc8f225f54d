//! Administration of form records: listing, lifecycle and schema edits.

use db::models::{
    form::{CreateForm, Form, FormStatus, UpdateForm},
    form_response::FormResponse,
    form_schema::{FormSchema, SchemaError},
};
use serde::{Deserialize, Serialize};
use serde_with::{NoneAsEmptyString, serde_as};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};
use ts_rs::TS;
use uuid::Uuid;
use utils::token::join_url;

#[derive(Debug, Error)]
pub enum FormServiceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("form not found")]
    NotFound,
    #[error("invalid schema: {0}")]
    Schema(#[from] SchemaError),
    #[error("Form title is required")]
    MissingTitle,
    #[error("schema is locked: {responses} responses already reference this form")]
    SchemaLocked { responses: i64 },
    #[error("cannot move form from {from} back to {to}")]
    InvalidTransition { from: FormStatus, to: FormStatus },
}

/// Query-string filter; an empty `status=` or `search=` means "any".
#[serde_as]
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(default)]
pub struct FormFilter {
    #[serde_as(as = "NoneAsEmptyString")]
    #[ts(as = "Option<FormStatus>")]
    pub status: Option<FormStatus>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[ts(as = "Option<String>")]
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct ShareLink {
    pub form_id: Uuid,
    pub url: String,
}

pub struct FormService {
    pool: SqlitePool,
}

impl FormService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, data: CreateForm) -> Result<Form, FormServiceError> {
        if data.title.trim().is_empty() {
            return Err(FormServiceError::MissingTitle);
        }
        data.form_schema.validate()?;

        let form = Form::create(&self.pool, Uuid::new_v4(), &data).await?;
        info!(
            form_id = %form.id,
            status = %form.status,
            fields = form.form_schema.len(),
            "Created form"
        );
        Ok(form)
    }

    pub async fn get(&self, id: Uuid) -> Result<Form, FormServiceError> {
        Form::find_by_id(&self.pool, id)
            .await?
            .ok_or(FormServiceError::NotFound)
    }

    /// Newest first, filtered by exact status and case-insensitive title match.
    pub async fn list(&self, filter: &FormFilter) -> Result<Vec<Form>, FormServiceError> {
        let needle = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let forms = Form::find_all(&self.pool)
            .await?
            .into_iter()
            .filter(|f| filter.status.is_none_or(|s| f.status == s))
            .filter(|f| {
                needle
                    .as_deref()
                    .is_none_or(|n| f.title.to_lowercase().contains(n))
            })
            .collect();
        Ok(forms)
    }

    /// Administrator-driven transition. Any form can be activated or closed;
    /// nothing returns to draft once it has left it.
    pub async fn set_status(&self, id: Uuid, target: FormStatus) -> Result<Form, FormServiceError> {
        let form = self.get(id).await?;
        if form.status == target {
            return Ok(form);
        }
        if target == FormStatus::Draft {
            return Err(FormServiceError::InvalidTransition {
                from: form.status,
                to: target,
            });
        }

        let updated = Form::update_status(&self.pool, id, target)
            .await?
            .ok_or(FormServiceError::NotFound)?;
        info!(form_id = %id, from = %form.status, to = %target, "Form status changed");
        Ok(updated)
    }

    /// Replace the schema. Refused once any response exists, so stored answers
    /// are always read against the schema they were given under.
    pub async fn update_schema(
        &self,
        id: Uuid,
        schema: FormSchema,
    ) -> Result<Form, FormServiceError> {
        schema.validate()?;

        if let Some(form) = Form::update_schema(&self.pool, id, &schema).await? {
            return Ok(form);
        }

        self.get(id).await?;
        let responses = FormResponse::count_by_form_id(&self.pool, id).await?;
        warn!(form_id = %id, responses, "Rejected schema edit on a form with responses");
        Err(FormServiceError::SchemaLocked { responses })
    }

    pub async fn update_details(
        &self,
        id: Uuid,
        data: UpdateForm,
    ) -> Result<Form, FormServiceError> {
        if data.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(FormServiceError::MissingTitle);
        }
        Form::update_details(&self.pool, id, &data)
            .await?
            .ok_or(FormServiceError::NotFound)
    }

    /// Delete a form together with all of its responses.
    pub async fn delete(&self, id: Uuid) -> Result<(), FormServiceError> {
        let rows = Form::delete(&self.pool, id).await?;
        if rows == 0 {
            return Err(FormServiceError::NotFound);
        }
        info!(form_id = %id, "Deleted form");
        Ok(())
    }

    /// Public submission URL for a form; the record id is the only token.
    pub async fn share_link(&self, id: Uuid, base_url: &str) -> Result<ShareLink, FormServiceError> {
        let form = self.get(id).await?;
        Ok(ShareLink {
            form_id: form.id,
            url: public_submission_url(base_url, form.id),
        })
    }
}

pub fn public_submission_url(base_url: &str, form_id: Uuid) -> String {
    join_url(base_url, &format!("submit/{}", form_id))
}
