//! Event repository implementation
//!
//! Events, the student directory and event registrations. Functions that the
//! check-in pipeline calls inside its transaction take any Postgres executor.

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};

use crate::models::event::{
    CreateEventRequest, Event, EventParticipant, EventStatus, ParticipationStatus,
    RegisterStudentRequest, Student,
};
use crate::utils::errors::OrgHubError;

const EVENT_COLUMNS: &str = "id, name, event_date, status, created_at, updated_at";
const PARTICIPANT_COLUMNS: &str = "id, event_id, student_id, participation_status, joined_at";

#[derive(Debug, Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new event
    pub async fn create(&self, request: CreateEventRequest, now: DateTime<Utc>) -> Result<Event, OrgHubError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events (name, event_date, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(request.name)
        .bind(request.event_date)
        .bind(request.status.unwrap_or(EventStatus::Upcoming))
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    /// Find event by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Event>, OrgHubError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    /// Check if an event exists
    pub async fn event_exists<'e, E>(executor: E, event_id: i64) -> Result<bool, OrgHubError>
    where
        E: PgExecutor<'e>,
    {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM events WHERE id = $1)")
            .bind(event_id)
            .fetch_one(executor)
            .await?;

        Ok(exists)
    }

    /// Insert a student or refresh the stored name and email
    pub async fn upsert_student(
        &self,
        request: RegisterStudentRequest,
        now: DateTime<Utc>,
    ) -> Result<Student, OrgHubError> {
        let student = sqlx::query_as::<_, Student>(
            r#"
            INSERT INTO students (student_id, full_name, email, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (student_id) DO UPDATE
                SET full_name = EXCLUDED.full_name,
                    email = COALESCE(EXCLUDED.email, students.email)
            RETURNING student_id, full_name, email, created_at
            "#,
        )
        .bind(request.student_id)
        .bind(request.full_name)
        .bind(request.email)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(student)
    }

    /// Find student by external student ID
    pub async fn find_student(&self, student_id: &str) -> Result<Option<Student>, OrgHubError> {
        let student = sqlx::query_as::<_, Student>(
            "SELECT student_id, full_name, email, created_at FROM students WHERE student_id = $1",
        )
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(student)
    }

    /// Register a student for an event
    pub async fn add_participant(
        &self,
        event_id: i64,
        student_id: &str,
        now: DateTime<Utc>,
    ) -> Result<EventParticipant, OrgHubError> {
        let participant = sqlx::query_as::<_, EventParticipant>(&format!(
            r#"
            INSERT INTO event_participants (event_id, student_id, participation_status, joined_at)
            VALUES ($1, $2, $3, $4)
            RETURNING {PARTICIPANT_COLUMNS}
            "#
        ))
        .bind(event_id)
        .bind(student_id)
        .bind(ParticipationStatus::Joined)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(participant)
    }

    /// Remove a registration; returns whether a row was deleted
    pub async fn remove_participant<'e, E>(executor: E, participant_id: i64) -> Result<bool, OrgHubError>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM event_participants WHERE id = $1")
            .bind(participant_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Find a registration and lock it against removal until the transaction
    /// ends. A concurrent leave waits for the check-in to commit.
    pub async fn find_participant_for_share<'e, E>(
        executor: E,
        event_id: i64,
        student_id: &str,
    ) -> Result<Option<EventParticipant>, OrgHubError>
    where
        E: PgExecutor<'e>,
    {
        let participant = sqlx::query_as::<_, EventParticipant>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM event_participants WHERE event_id = $1 AND student_id = $2 FOR SHARE"
        ))
        .bind(event_id)
        .bind(student_id)
        .fetch_optional(executor)
        .await?;

        Ok(participant)
    }

    /// Find a registration and lock it for removal
    pub async fn find_participant_for_update<'e, E>(
        executor: E,
        event_id: i64,
        student_id: &str,
    ) -> Result<Option<EventParticipant>, OrgHubError>
    where
        E: PgExecutor<'e>,
    {
        let participant = sqlx::query_as::<_, EventParticipant>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM event_participants WHERE event_id = $1 AND student_id = $2 FOR UPDATE"
        ))
        .bind(event_id)
        .bind(student_id)
        .fetch_optional(executor)
        .await?;

        Ok(participant)
    }

    /// Check if student is registered for event
    pub async fn participant_exists(&self, event_id: i64, student_id: &str) -> Result<bool, OrgHubError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM event_participants WHERE event_id = $1 AND student_id = $2)",
        )
        .bind(event_id)
        .bind(student_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Get event participants
    pub async fn get_participants(&self, event_id: i64) -> Result<Vec<EventParticipant>, OrgHubError> {
        let participants = sqlx::query_as::<_, EventParticipant>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM event_participants WHERE event_id = $1 ORDER BY joined_at ASC, id ASC"
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(participants)
    }

    /// Get participant count for event
    pub async fn get_participant_count(&self, event_id: i64) -> Result<i64, OrgHubError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM event_participants WHERE event_id = $1")
            .bind(event_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
