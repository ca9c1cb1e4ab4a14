//! Event session model and its status lifecycle

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

use crate::utils::errors::OrgHubError;

/// Lifecycle state of an event session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "session_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    /// Created, attendance not yet taken
    Pending,
    /// Attendance window open
    Active,
    /// Closed
    Completed,
}

impl SessionStatus {
    pub const ALL: [SessionStatus; 3] = [
        SessionStatus::Pending,
        SessionStatus::Active,
        SessionStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "PENDING",
            SessionStatus::Active => "ACTIVE",
            SessionStatus::Completed => "COMPLETED",
        }
    }

    /// Whether the strict lifecycle permits moving from `self` to `next`.
    ///
    /// Setting the current status again is always allowed. ACTIVE may drop
    /// back to PENDING to pause a session; COMPLETED is terminal.
    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        use SessionStatus::*;
        matches!(
            (self, next),
            (Pending, Pending)
                | (Active, Active)
                | (Completed, Completed)
                | (Pending, Active)
                | (Active, Completed)
                | (Active, Pending)
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = OrgHubError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(SessionStatus::Pending),
            "ACTIVE" => Ok(SessionStatus::Active),
            "COMPLETED" => Ok(SessionStatus::Completed),
            _ => Err(OrgHubError::InvalidStatus(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EventSession {
    pub id: i64,
    pub event_id: i64,
    pub name: String,
    pub session_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: SessionStatus,
    pub qr_token_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventSession {
    /// True when `now`, seen in the organization's local offset, falls on the
    /// session date strictly between its start and end times.
    pub fn is_within_window(&self, now: DateTime<Utc>, offset: FixedOffset) -> bool {
        let local = now.with_timezone(&offset);
        let time = local.time();
        local.date_naive() == self.session_date && self.start_time < time && time < self.end_time
    }

    /// Status is ACTIVE and the clock is inside the scheduled window
    pub fn is_active_at(&self, now: DateTime<Utc>, offset: FixedOffset) -> bool {
        self.status == SessionStatus::Active && self.is_within_window(now, offset)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub event_id: i64,
    pub name: String,
    pub session_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}
