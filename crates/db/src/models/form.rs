use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, Type, types::Json};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

use super::form_schema::FormSchema;

/// Lifecycle of a form. Only administrators move a form between states.
#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "form_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FormStatus {
    #[default]
    Draft,
    Active,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct Form {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub event_type: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub status: FormStatus,
    pub form_schema: FormSchema,
    pub allow_multiple_submissions: bool,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct FormRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    event_type: Option<String>,
    event_date: Option<NaiveDate>,
    status: FormStatus,
    form_schema: Json<FormSchema>,
    allow_multiple_submissions: bool,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<FormRow> for Form {
    fn from(row: FormRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            event_type: row.event_type,
            event_date: row.event_date,
            status: row.status,
            form_schema: row.form_schema.0,
            allow_multiple_submissions: row.allow_multiple_submissions,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const FORM_COLUMNS: &str = "id, title, description, event_type, event_date, status, form_schema, \
     allow_multiple_submissions, created_by, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct CreateForm {
    pub title: String,
    pub description: Option<String>,
    pub event_type: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub status: Option<FormStatus>,
    #[serde(default)]
    pub form_schema: FormSchema,
    pub allow_multiple_submissions: Option<bool>,
    pub created_by: Option<String>,
}

impl CreateForm {
    pub fn titled(title: impl Into<String>, status: FormStatus) -> Self {
        Self {
            title: title.into(),
            description: None,
            event_type: None,
            event_date: None,
            status: Some(status),
            form_schema: FormSchema::default(),
            allow_multiple_submissions: None,
            created_by: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpdateForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub event_type: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub allow_multiple_submissions: Option<bool>,
}

impl Form {
    pub async fn create(pool: &SqlitePool, id: Uuid, data: &CreateForm) -> Result<Self, sqlx::Error> {
        let status = data.status.unwrap_or_default();
        let allow_multiple = data.allow_multiple_submissions.unwrap_or(true);
        sqlx::query_as::<_, FormRow>(&format!(
            r#"INSERT INTO forms (id, title, description, event_type, event_date, status, form_schema, allow_multiple_submissions, created_by)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               RETURNING {FORM_COLUMNS}"#
        ))
        .bind(id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.event_type)
        .bind(data.event_date)
        .bind(status)
        .bind(Json(&data.form_schema))
        .bind(allow_multiple)
        .bind(&data.created_by)
        .fetch_one(pool)
        .await
        .map(Into::into)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, FormRow>(&format!(
            "SELECT {FORM_COLUMNS} FROM forms WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map(|row| row.map(Into::into))
    }

    /// Every form, newest first.
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        let rows = sqlx::query_as::<_, FormRow>(&format!(
            "SELECT {FORM_COLUMNS} FROM forms ORDER BY created_at DESC, rowid DESC"
        ))
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn update_status(
        pool: &SqlitePool,
        id: Uuid,
        status: FormStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, FormRow>(&format!(
            r#"UPDATE forms
               SET status = $2, updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING {FORM_COLUMNS}"#
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(pool)
        .await
        .map(|row| row.map(Into::into))
    }

    /// Replace the schema of a form that has no responses yet. `None` when the
    /// form is missing or already answered; the response check and the write
    /// are one statement, so a concurrent submission cannot slip in between.
    pub async fn update_schema(
        pool: &SqlitePool,
        id: Uuid,
        schema: &FormSchema,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, FormRow>(&format!(
            r#"UPDATE forms
               SET form_schema = $2, updated_at = datetime('now', 'subsec')
               WHERE id = $1
                 AND NOT EXISTS (SELECT 1 FROM form_responses WHERE form_id = $1)
               RETURNING {FORM_COLUMNS}"#
        ))
        .bind(id)
        .bind(Json(schema))
        .fetch_optional(pool)
        .await
        .map(|row| row.map(Into::into))
    }

    /// Apply the metadata fields present in `data`; absent fields are kept.
    pub async fn update_details(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateForm,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, FormRow>(&format!(
            r#"UPDATE forms
               SET title = COALESCE($2, title),
                   description = COALESCE($3, description),
                   event_type = COALESCE($4, event_type),
                   event_date = COALESCE($5, event_date),
                   allow_multiple_submissions = COALESCE($6, allow_multiple_submissions),
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING {FORM_COLUMNS}"#
        ))
        .bind(id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.event_type)
        .bind(data.event_date)
        .bind(data.allow_multiple_submissions)
        .fetch_optional(pool)
        .await
        .map(|row| row.map(Into::into))
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM forms WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
