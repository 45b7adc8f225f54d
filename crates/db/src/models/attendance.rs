use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "attendance_method", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttendanceMethod {
    #[default]
    Digital,
    Manual,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, TS)]
pub struct Attendance {
    pub id: Uuid,
    pub member_id: Uuid,
    pub event_id: Uuid,
    pub attendance_method: AttendanceMethod,
    pub checked_in_at: DateTime<Utc>,
}

impl Attendance {
    pub async fn create(
        pool: &SqlitePool,
        id: Uuid,
        member_id: Uuid,
        event_id: Uuid,
        method: AttendanceMethod,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Attendance>(
            r#"INSERT INTO attendance (id, member_id, event_id, attendance_method)
               VALUES ($1, $2, $3, $4)
               RETURNING id, member_id, event_id, attendance_method, checked_in_at"#,
        )
        .bind(id)
        .bind(member_id)
        .bind(event_id)
        .bind(method)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_event_id(
        pool: &SqlitePool,
        event_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Attendance>(
            r#"SELECT id, member_id, event_id, attendance_method, checked_in_at
               FROM attendance
               WHERE event_id = $1
               ORDER BY checked_in_at ASC"#,
        )
        .bind(event_id)
        .fetch_all(pool)
        .await
    }

    pub async fn count_by_event(pool: &SqlitePool, event_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM attendance WHERE event_id = $1")
            .bind(event_id)
            .fetch_one(pool)
            .await
    }
}
