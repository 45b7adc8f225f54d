//! Event management and self-service attendance check-in.

use db::models::{
    attendance::{Attendance, AttendanceMethod},
    event::{CreateEvent, Event},
    member::{Member, MemberProfile, VisitorStatus},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info};
use ts_rs::TS;
use utils::{phone::is_valid_nigerian_phone, token};
use uuid::Uuid;

pub const MIN_AGE: i64 = 16;
pub const MAX_AGE: i64 = 35;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

impl FieldIssue {
    fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CheckInError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("check-in details are invalid")]
    Invalid(Vec<FieldIssue>),
    #[error("Invalid or inactive event")]
    InvalidEvent,
    #[error("not found")]
    NotFound,
}

/// Self-reported details from the check-in page.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CheckIn {
    pub full_name: String,
    pub age: i64,
    pub phone_number: String,
    pub course_of_study: String,
    pub level: String,
    pub hall_hostel: String,
    pub visitor_status: Option<VisitorStatus>,
    pub data_consent: bool,
}

impl CheckIn {
    /// Every problem at once, so the page can flag all offending inputs.
    pub fn validate(&self) -> Result<MemberProfile, Vec<FieldIssue>> {
        let mut issues = Vec::new();

        if self.full_name.trim().chars().count() < 2 {
            issues.push(FieldIssue::new(
                "full_name",
                "Full name must be at least 2 characters",
            ));
        }
        if !(MIN_AGE..=MAX_AGE).contains(&self.age) {
            issues.push(FieldIssue::new("age", "Age must be between 16 and 35"));
        }
        if !is_valid_nigerian_phone(&self.phone_number) {
            issues.push(FieldIssue::new(
                "phone_number",
                "Please enter a valid Nigerian phone number",
            ));
        }
        for (field, value, message) in [
            (
                "course_of_study",
                &self.course_of_study,
                "Please select your course of study",
            ),
            ("level", &self.level, "Please select your level"),
            ("hall_hostel", &self.hall_hostel, "Please select your hall/hostel"),
        ] {
            if value.trim().is_empty() {
                issues.push(FieldIssue::new(field, message));
            }
        }
        if self.visitor_status.is_none() {
            issues.push(FieldIssue::new(
                "visitor_status",
                "Please select your visitor status",
            ));
        }
        if !self.data_consent {
            issues.push(FieldIssue::new(
                "data_consent",
                "You must consent to data processing",
            ));
        }

        match self.visitor_status {
            Some(visitor_status) if issues.is_empty() => Ok(MemberProfile {
                full_name: self.full_name.trim().to_string(),
                age: self.age,
                phone_number: self.phone_number.clone(),
                course_of_study: self.course_of_study.clone(),
                level: self.level.clone(),
                hall_hostel: self.hall_hostel.clone(),
                visitor_status,
                data_consent: self.data_consent,
            }),
            _ => Err(issues),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CheckInReceipt {
    pub member: Member,
    /// Absent when the check-in carried no event token.
    pub attendance: Option<Attendance>,
}

pub struct AttendanceService {
    pool: SqlitePool,
}

impl AttendanceService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_event(&self, data: &CreateEvent) -> Result<Event, CheckInError> {
        let token = token::event_check_in_token();
        let event = Event::create(&self.pool, Uuid::new_v4(), data, &token).await?;
        info!(event_id = %event.id, event_name = %event.event_name, "Created event");
        Ok(event)
    }

    pub async fn list_events(&self) -> Result<Vec<Event>, CheckInError> {
        Ok(Event::find_all(&self.pool).await?)
    }

    pub async fn set_event_active(
        &self,
        event_id: Uuid,
        is_active: bool,
    ) -> Result<Event, CheckInError> {
        let event = Event::set_active(&self.pool, event_id, is_active)
            .await?
            .ok_or(CheckInError::NotFound)?;
        info!(event_id = %event_id, is_active, "Event activation changed");
        Ok(event)
    }

    pub async fn attendance_count(&self, event_id: Uuid) -> Result<i64, CheckInError> {
        Event::find_by_id(&self.pool, event_id)
            .await?
            .ok_or(CheckInError::NotFound)?;
        Ok(Attendance::count_by_event(&self.pool, event_id).await?)
    }

    /// Validate, resolve the event, upsert the member by phone number and
    /// record a digital attendance when an event was given.
    pub async fn check_in(
        &self,
        event_token: Option<&str>,
        details: CheckIn,
    ) -> Result<CheckInReceipt, CheckInError> {
        let profile = details.validate().map_err(CheckInError::Invalid)?;

        let event = match event_token.filter(|t| !t.is_empty()) {
            Some(token) => Some(
                Event::find_active_by_token(&self.pool, token)
                    .await?
                    .ok_or(CheckInError::InvalidEvent)?,
            ),
            None => None,
        };

        let member = Member::upsert_by_phone(&self.pool, Uuid::new_v4(), &profile).await?;
        debug!(member_id = %member.id, "Member profile recorded");

        let Some(event) = event else {
            return Ok(CheckInReceipt {
                member,
                attendance: None,
            });
        };

        let attendance = Attendance::create(
            &self.pool,
            Uuid::new_v4(),
            member.id,
            event.id,
            AttendanceMethod::Digital,
        )
        .await?;
        Member::touch_last_attendance(&self.pool, member.id, event.event_date).await?;
        info!(event_id = %event.id, member_id = %member.id, "Digital check-in recorded");

        let member = Member::find_by_id(&self.pool, member.id)
            .await?
            .ok_or(CheckInError::NotFound)?;
        Ok(CheckInReceipt {
            member,
            attendance: Some(attendance),
        })
    }

    /// Attendance entered by an usher on someone's behalf.
    pub async fn record_manual(
        &self,
        event_id: Uuid,
        member_id: Uuid,
    ) -> Result<Attendance, CheckInError> {
        let event = Event::find_by_id(&self.pool, event_id)
            .await?
            .ok_or(CheckInError::NotFound)?;
        Member::find_by_id(&self.pool, member_id)
            .await?
            .ok_or(CheckInError::NotFound)?;

        let attendance = Attendance::create(
            &self.pool,
            Uuid::new_v4(),
            member_id,
            event_id,
            AttendanceMethod::Manual,
        )
        .await?;
        Member::touch_last_attendance(&self.pool, member_id, event.event_date).await?;
        Ok(attendance)
    }

    pub fn check_in_url(&self, base_url: &str, event: &Event) -> String {
        token::check_in_url(base_url, &event.qr_code_token)
    }
}
