//! Event session repository implementation

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgExecutor, PgPool};

use crate::models::session::{CreateSessionRequest, EventSession, SessionStatus};
use crate::utils::errors::OrgHubError;

const SESSION_COLUMNS: &str =
    "id, event_id, name, session_date, start_time, end_time, status, qr_token_code, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new PENDING session without a QR code
    pub async fn insert<'e, E>(
        executor: E,
        request: &CreateSessionRequest,
        now: DateTime<Utc>,
    ) -> Result<EventSession, OrgHubError>
    where
        E: PgExecutor<'e>,
    {
        let session = sqlx::query_as::<_, EventSession>(&format!(
            r#"
            INSERT INTO event_sessions (event_id, name, session_date, start_time, end_time, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(request.event_id)
        .bind(&request.name)
        .bind(request.session_date)
        .bind(request.start_time)
        .bind(request.end_time)
        .bind(SessionStatus::Pending)
        .bind(now)
        .fetch_one(executor)
        .await?;

        Ok(session)
    }

    /// Store the admin-facing QR token for a session
    pub async fn set_qr_token<'e, E>(
        executor: E,
        session_id: i64,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<EventSession>, OrgHubError>
    where
        E: PgExecutor<'e>,
    {
        let session = sqlx::query_as::<_, EventSession>(&format!(
            r#"
            UPDATE event_sessions
            SET qr_token_code = $2, updated_at = $3
            WHERE id = $1
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(session_id)
        .bind(token)
        .bind(now)
        .fetch_optional(executor)
        .await?;

        Ok(session)
    }

    /// Find session by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<EventSession>, OrgHubError> {
        let session = sqlx::query_as::<_, EventSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM event_sessions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Find session by ID and hold a share lock until the transaction ends,
    /// so its status cannot change underneath a check-in.
    pub async fn find_by_id_for_share<'e, E>(executor: E, id: i64) -> Result<Option<EventSession>, OrgHubError>
    where
        E: PgExecutor<'e>,
    {
        let session = sqlx::query_as::<_, EventSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM event_sessions WHERE id = $1 FOR SHARE"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(session)
    }

    /// Get sessions of an event
    pub async fn find_by_event_id(&self, event_id: i64) -> Result<Vec<EventSession>, OrgHubError> {
        let sessions = sqlx::query_as::<_, EventSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM event_sessions WHERE event_id = $1 ORDER BY session_date ASC, start_time ASC, id ASC"
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    /// Get sessions of an event on a given date
    pub async fn find_by_event_id_and_date(
        &self,
        event_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<EventSession>, OrgHubError> {
        let sessions = sqlx::query_as::<_, EventSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM event_sessions WHERE event_id = $1 AND session_date = $2 ORDER BY start_time ASC, id ASC"
        ))
        .bind(event_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    /// Update session status
    pub async fn update_status<'e, E>(
        executor: E,
        id: i64,
        status: SessionStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<EventSession>, OrgHubError>
    where
        E: PgExecutor<'e>,
    {
        let session = sqlx::query_as::<_, EventSession>(&format!(
            r#"
            UPDATE event_sessions
            SET status = $2, updated_at = $3
            WHERE id = $1
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status)
        .bind(now)
        .fetch_optional(executor)
        .await?;

        Ok(session)
    }

    /// Lock a session row for a status change
    pub async fn find_by_id_for_update<'e, E>(executor: E, id: i64) -> Result<Option<EventSession>, OrgHubError>
    where
        E: PgExecutor<'e>,
    {
        let session = sqlx::query_as::<_, EventSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM event_sessions WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(session)
    }
}
