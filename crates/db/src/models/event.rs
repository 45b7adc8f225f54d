use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// A service or meeting members check into through its QR token.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, TS)]
pub struct Event {
    pub id: Uuid,
    pub event_name: String,
    pub event_type: String,
    pub event_date: NaiveDate,
    pub event_time: String, // "HH:MM" as entered
    pub description: Option<String>,
    pub qr_code_token: String,
    pub is_active: bool,
    pub manual_headcount: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateEvent {
    pub event_name: String,
    pub event_type: String,
    pub event_date: NaiveDate,
    pub event_time: String,
    pub description: Option<String>,
}

const EVENT_COLUMNS: &str = "id, event_name, event_type, event_date, event_time, description, \
     qr_code_token, is_active, manual_headcount, created_at, updated_at";

impl Event {
    pub async fn create(
        pool: &SqlitePool,
        id: Uuid,
        data: &CreateEvent,
        qr_code_token: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Event>(&format!(
            r#"INSERT INTO events (id, event_name, event_type, event_date, event_time, description, qr_code_token, is_active)
               VALUES ($1, $2, $3, $4, $5, $6, $7, 1)
               RETURNING {EVENT_COLUMNS}"#
        ))
        .bind(id)
        .bind(&data.event_name)
        .bind(&data.event_type)
        .bind(data.event_date)
        .bind(&data.event_time)
        .bind(&data.description)
        .bind(qr_code_token)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Event>(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Active event carrying `token`, if any.
    pub async fn find_active_by_token(
        pool: &SqlitePool,
        token: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE qr_code_token = $1 AND is_active = 1"
        ))
        .bind(token)
        .fetch_optional(pool)
        .await
    }

    /// Every event, most recent event date first.
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY event_date DESC, created_at DESC"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn set_active(
        pool: &SqlitePool,
        id: Uuid,
        is_active: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Event>(&format!(
            r#"UPDATE events
               SET is_active = $2, updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING {EVENT_COLUMNS}"#
        ))
        .bind(id)
        .bind(is_active)
        .fetch_optional(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DBService;

    fn sunday() -> CreateEvent {
        CreateEvent {
            event_name: "Sunday Service".into(),
            event_type: "Sunday Service".into(),
            event_date: NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
            event_time: "09:00".into(),
            description: None,
        }
    }

    #[tokio::test]
    async fn token_lookup_ignores_inactive_events() {
        let db = DBService::new_in_memory().await.unwrap();
        let event = Event::create(&db.pool, Uuid::new_v4(), &sunday(), "tok123")
            .await
            .unwrap();
        assert!(event.is_active);

        let found = Event::find_active_by_token(&db.pool, "tok123").await.unwrap();
        assert_eq!(found.map(|e| e.id), Some(event.id));

        Event::set_active(&db.pool, event.id, false).await.unwrap();
        assert!(Event::find_active_by_token(&db.pool, "tok123")
            .await
            .unwrap()
            .is_none());
        assert!(Event::find_active_by_token(&db.pool, "other").await.unwrap().is_none());
    }
}
