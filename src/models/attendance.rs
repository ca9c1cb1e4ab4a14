//! Attendance record model and the query shapes used to read it back

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One check-in: a participant was present at a session at `checked_in_at`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AttendanceRecord {
    pub id: i64,
    pub event_participant_id: i64,
    pub event_session_id: i64,
    pub checked_in_at: DateTime<Utc>,
    /// The presented token, verbatim
    pub qr_token_used: String,
}

#[derive(Debug, Clone)]
pub struct NewAttendanceRecord {
    pub event_participant_id: i64,
    pub event_session_id: i64,
    pub checked_in_at: DateTime<Utc>,
    pub qr_token_used: String,
}

/// Attendance record joined with student, session and event details
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AttendanceEntry {
    pub id: i64,
    pub event_participant_id: i64,
    pub event_session_id: i64,
    pub checked_in_at: DateTime<Utc>,
    pub student_id: String,
    pub student_name: String,
    pub session_name: String,
    pub session_date: NaiveDate,
    pub event_id: i64,
    pub event_name: String,
}

/// Optional filters for attendance search; unset fields do not restrict
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttendanceFilter {
    pub student_id: Option<String>,
    /// Case-insensitive substring of the student's name
    pub student_name: Option<String>,
    pub session_id: Option<i64>,
    /// Case-insensitive substring of the session name
    pub session_name: Option<String>,
    pub event_id: Option<i64>,
    /// Inclusive lower bound on check-in time
    pub checked_in_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on check-in time
    pub checked_in_to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttendanceSortField {
    #[default]
    CheckedInAt,
    StudentName,
    SessionName,
}

impl AttendanceSortField {
    pub(crate) fn column(&self) -> &'static str {
        match self {
            AttendanceSortField::CheckedInAt => "ar.checked_in_at",
            AttendanceSortField::StudentName => "st.full_name",
            AttendanceSortField::SessionName => "es.name",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub(crate) fn keyword(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSort {
    pub field: AttendanceSortField,
    pub direction: SortDirection,
}

impl AttendanceSort {
    pub fn new(field: AttendanceSortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }
}

/// Headcount for a session against its event's roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionAttendanceSummary {
    pub session_id: i64,
    pub participants: i64,
    pub attended: i64,
}

impl SessionAttendanceSummary {
    pub fn absent(&self) -> i64 {
        (self.participants - self.attended).max(0)
    }

    /// Attendance rate in percent, 0 for an empty roster
    pub fn rate(&self) -> f64 {
        if self.participants == 0 {
            0.0
        } else {
            self.attended as f64 * 100.0 / self.participants as f64
        }
    }
}
