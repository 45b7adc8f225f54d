use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display)]
#[sqlx(type_name = "visitor_status")]
pub enum VisitorStatus {
    #[sqlx(rename = "First-Timer")]
    #[serde(rename = "First-Timer")]
    #[strum(serialize = "First-Timer")]
    FirstTimer,
    #[sqlx(rename = "Regular Member")]
    #[serde(rename = "Regular Member")]
    #[strum(serialize = "Regular Member")]
    RegularMember,
    #[sqlx(rename = "Returning Guest")]
    #[serde(rename = "Returning Guest")]
    #[strum(serialize = "Returning Guest")]
    ReturningGuest,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, TS)]
pub struct Member {
    pub id: Uuid,
    pub full_name: String,
    pub age: i64,
    pub phone_number: String,
    pub course_of_study: String,
    pub level: String,
    pub hall_hostel: String,
    pub visitor_status: VisitorStatus,
    pub data_consent: bool,
    pub is_active: bool,
    pub last_attendance_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile fields collected at check-in.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct MemberProfile {
    pub full_name: String,
    pub age: i64,
    pub phone_number: String,
    pub course_of_study: String,
    pub level: String,
    pub hall_hostel: String,
    pub visitor_status: VisitorStatus,
    pub data_consent: bool,
}

const MEMBER_COLUMNS: &str = "id, full_name, age, phone_number, course_of_study, level, hall_hostel, \
     visitor_status, data_consent, is_active, last_attendance_date, created_at, updated_at";

impl Member {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Member>(&format!("SELECT {MEMBER_COLUMNS} FROM members WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a member, or refresh the profile of the one already holding
    /// this phone number. Phone number, consent and id stay as first recorded.
    pub async fn upsert_by_phone(
        pool: &SqlitePool,
        id: Uuid,
        profile: &MemberProfile,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Member>(&format!(
            r#"INSERT INTO members (id, full_name, age, phone_number, course_of_study, level, hall_hostel, visitor_status, data_consent)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               ON CONFLICT(phone_number) DO UPDATE SET
                   full_name = excluded.full_name,
                   age = excluded.age,
                   course_of_study = excluded.course_of_study,
                   level = excluded.level,
                   hall_hostel = excluded.hall_hostel,
                   visitor_status = excluded.visitor_status,
                   updated_at = datetime('now', 'subsec')
               RETURNING {MEMBER_COLUMNS}"#
        ))
        .bind(id)
        .bind(&profile.full_name)
        .bind(profile.age)
        .bind(&profile.phone_number)
        .bind(&profile.course_of_study)
        .bind(&profile.level)
        .bind(&profile.hall_hostel)
        .bind(profile.visitor_status)
        .bind(profile.data_consent)
        .fetch_one(pool)
        .await
    }

    pub async fn touch_last_attendance(
        pool: &SqlitePool,
        id: Uuid,
        date: NaiveDate,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE members SET last_attendance_date = $2, updated_at = datetime('now', 'subsec') WHERE id = $1",
        )
        .bind(id)
        .bind(date)
        .execute(pool)
        .await?;
        Ok(())
    }
}
