use db::models::{form::Form, form_response::FormResponse};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use super::response_aggregator::{self, FieldFrequency};

#[derive(Debug, Error)]
pub enum ResponseServiceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("form not found")]
    FormNotFound,
}

pub struct ResponseService {
    pool: SqlitePool,
}

impl ResponseService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn form(&self, form_id: Uuid) -> Result<Form, ResponseServiceError> {
        Form::find_by_id(&self.pool, form_id)
            .await?
            .ok_or(ResponseServiceError::FormNotFound)
    }

    /// Responses newest first. `search` keeps those where any answer contains
    /// the term, ignoring case.
    pub async fn list(
        &self,
        form_id: Uuid,
        search: Option<&str>,
    ) -> Result<Vec<FormResponse>, ResponseServiceError> {
        self.form(form_id).await?;
        let responses = FormResponse::find_by_form_id(&self.pool, form_id).await?;

        let Some(needle) = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
        else {
            return Ok(responses);
        };

        Ok(responses
            .into_iter()
            .filter(|r| {
                r.response_data
                    .iter()
                    .any(|(_, v)| v.display().to_lowercase().contains(&needle))
            })
            .collect())
    }

    /// Frequency tables for the form's enumerable fields, recomputed from
    /// scratch on every call.
    pub async fn analytics(&self, form_id: Uuid) -> Result<Vec<FieldFrequency>, ResponseServiceError> {
        let form = self.form(form_id).await?;
        let responses = FormResponse::find_by_form_id(&self.pool, form_id).await?;
        Ok(response_aggregator::aggregate(&form.form_schema, &responses))
    }

    /// Bulk administrative purge.
    pub async fn purge(&self, form_id: Uuid) -> Result<u64, ResponseServiceError> {
        self.form(form_id).await?;
        let removed = FormResponse::delete_by_form_id(&self.pool, form_id).await?;
        info!(form_id = %form_id, removed, "Purged form responses");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use db::{
        DBService,
        models::{
            form::{CreateForm, FormStatus},
            form_response::{AnswerMap, AnswerValue},
        },
    };

    use super::*;

    async fn seeded() -> (ResponseService, Uuid) {
        let db = DBService::new_in_memory().await.unwrap();
        let form = Form::create(
            &db.pool,
            Uuid::new_v4(),
            &CreateForm::titled("Visitors", FormStatus::Active),
        )
        .await
        .unwrap();

        for (name, hall) in [("Ada Obi", "Hall A"), ("Tunde Bello", "Off-Campus")] {
            let answers: AnswerMap = [
                ("name".to_string(), AnswerValue::Text(name.into())),
                ("hall".to_string(), AnswerValue::Choice(hall.into())),
            ]
            .into_iter()
            .collect();
            FormResponse::create(&db.pool, Uuid::new_v4(), form.id, &answers, Utc::now())
                .await
                .unwrap();
        }
        (ResponseService::new(db.pool), form.id)
    }

    #[tokio::test]
    async fn search_matches_any_answer_case_insensitively() {
        let (service, form_id) = seeded().await;

        assert_eq!(service.list(form_id, None).await.unwrap().len(), 2);
        assert_eq!(service.list(form_id, Some("  ")).await.unwrap().len(), 2);

        let hits = service.list(form_id, Some("off-CAMPUS")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(
            hits[0].response_data.get("name"),
            Some(&AnswerValue::Text("Tunde Bello".into()))
        );
    }

    #[tokio::test]
    async fn purge_removes_everything_for_the_form() {
        let (service, form_id) = seeded().await;
        assert_eq!(service.purge(form_id).await.unwrap(), 2);
        assert!(service.list(form_id, None).await.unwrap().is_empty());
        assert!(matches!(
            service.purge(Uuid::new_v4()).await,
            Err(ResponseServiceError::FormNotFound)
        ));
    }
}
