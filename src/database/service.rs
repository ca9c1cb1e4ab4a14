//! Database service layer
//!
//! Bundles the repositories over one pool and owns transaction creation.

use sqlx::{Postgres, Transaction};

use crate::database::{AttendanceRepository, DatabasePool, EventRepository, SessionRepository};
use crate::utils::errors::OrgHubError;

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pub events: EventRepository,
    pub sessions: SessionRepository,
    pub attendance: AttendanceRepository,
    pool: DatabasePool,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            events: EventRepository::new(pool.clone()),
            sessions: SessionRepository::new(pool.clone()),
            attendance: AttendanceRepository::new(pool.clone()),
            pool,
        }
    }

    /// Begin a transaction; dropping it without commit rolls back
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, OrgHubError> {
        Ok(self.pool.begin().await?)
    }

    /// Roll back after a failed unit of work. A rollback failure is logged and
    /// swallowed so the caller can return the error that caused it.
    pub async fn rollback(tx: Transaction<'static, Postgres>, operation: &str) {
        if let Err(e) = tx.rollback().await {
            tracing::error!(operation = operation, error = %e, "Transaction rollback failed");
        }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// Get system statistics
    pub async fn get_system_stats(&self) -> Result<serde_json::Value, OrgHubError> {
        let (events, sessions, active_sessions, participants, records): (i64, i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM events),
                    (SELECT COUNT(*) FROM event_sessions),
                    (SELECT COUNT(*) FROM event_sessions WHERE status = 'ACTIVE'),
                    (SELECT COUNT(*) FROM event_participants),
                    (SELECT COUNT(*) FROM attendance_records)
                "#,
            )
            .fetch_one(&self.pool)
            .await?;

        Ok(serde_json::json!({
            "events": events,
            "sessions": sessions,
            "active_sessions": active_sessions,
            "participants": participants,
            "attendance_records": records,
        }))
    }
}
