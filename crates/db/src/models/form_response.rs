use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, types::Json};
use ts_rs::TS;
use uuid::Uuid;

use super::form_schema::FieldKind;

/// A single answer as produced by the control bound to a field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AnswerValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    Choice(String),
}

impl AnswerValue {
    /// Value a freshly rendered control starts with.
    pub fn initial_for(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Boolean => AnswerValue::Boolean(false),
            FieldKind::Select | FieldKind::Radio => AnswerValue::Choice(String::new()),
            _ => AnswerValue::Text(String::new()),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            AnswerValue::Text(s) | AnswerValue::Choice(s) => s.trim().is_empty(),
            AnswerValue::Number(_) | AnswerValue::Boolean(_) => false,
        }
    }

    /// Human readable rendering used for search and tallies.
    pub fn display(&self) -> String {
        match self {
            AnswerValue::Text(s) | AnswerValue::Choice(s) => s.clone(),
            AnswerValue::Number(n) => n.to_string(),
            AnswerValue::Boolean(true) => "Yes".to_string(),
            AnswerValue::Boolean(false) => "No".to_string(),
        }
    }
}

/// Answers keyed by field identifier.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, TS)]
pub struct AnswerMap(pub BTreeMap<String, AnswerValue>);

impl AnswerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the answer for `field_id`, returning the previous one.
    pub fn set(&mut self, field_id: impl Into<String>, value: AnswerValue) -> Option<AnswerValue> {
        self.0.insert(field_id.into(), value)
    }

    pub fn get(&self, field_id: &str) -> Option<&AnswerValue> {
        self.0.get(field_id)
    }

    pub fn contains(&self, field_id: &str) -> bool {
        self.0.contains_key(field_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AnswerValue)> {
        self.0.iter()
    }

    /// Overlay every entry of `other`, keeping keys this map doesn't know.
    pub fn extend(&mut self, other: AnswerMap) {
        self.0.extend(other.0);
    }
}

impl FromIterator<(String, AnswerValue)> for AnswerMap {
    fn from_iter<I: IntoIterator<Item = (String, AnswerValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A stored submission. Never updated once written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct FormResponse {
    pub id: Uuid,
    pub form_id: Uuid,
    pub response_data: AnswerMap,
    pub submitted_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct FormResponseRow {
    id: Uuid,
    form_id: Uuid,
    response_data: Json<AnswerMap>,
    submitted_at: DateTime<Utc>,
}

impl From<FormResponseRow> for FormResponse {
    fn from(row: FormResponseRow) -> Self {
        Self {
            id: row.id,
            form_id: row.form_id,
            response_data: row.response_data.0,
            submitted_at: row.submitted_at,
        }
    }
}

impl FormResponse {
    pub async fn create(
        pool: &SqlitePool,
        id: Uuid,
        form_id: Uuid,
        response_data: &AnswerMap,
        submitted_at: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, FormResponseRow>(
            r#"INSERT INTO form_responses (id, form_id, response_data, submitted_at)
               VALUES ($1, $2, $3, $4)
               RETURNING id, form_id, response_data, submitted_at"#,
        )
        .bind(id)
        .bind(form_id)
        .bind(Json(response_data))
        .bind(submitted_at)
        .fetch_one(pool)
        .await
        .map(Into::into)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, FormResponseRow>(
            r#"SELECT id, form_id, response_data, submitted_at
               FROM form_responses
               WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map(|row| row.map(Into::into))
    }

    /// All responses for a form, newest first.
    pub async fn find_by_form_id(
        pool: &SqlitePool,
        form_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let rows = sqlx::query_as::<_, FormResponseRow>(
            r#"SELECT id, form_id, response_data, submitted_at
               FROM form_responses
               WHERE form_id = $1
               ORDER BY submitted_at DESC, rowid DESC"#,
        )
        .bind(form_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn count_by_form_id(pool: &SqlitePool, form_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM form_responses WHERE form_id = $1")
            .bind(form_id)
            .fetch_one(pool)
            .await
    }

    /// Bulk administrative purge.
    pub async fn delete_by_form_id<'e, E>(executor: E, form_id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM form_responses WHERE form_id = $1")
            .bind(form_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
