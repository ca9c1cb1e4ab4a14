//! Event session lifecycle
//!
//! Sessions are created PENDING with an admin-scoped QR token, opened and
//! closed by admins, and never deleted.

use chrono::{NaiveDate, NaiveTime};
use sqlx::{Postgres, Transaction};
use tracing::{debug, info};

use crate::config::settings::Settings;
use crate::database::{DatabaseService, EventRepository, SessionRepository};
use crate::models::session::{CreateSessionRequest, EventSession, SessionStatus};
use crate::services::qr::QrTokenService;
use crate::utils::clock::SharedClock;
use crate::utils::errors::{OrgHubError, Result};
use crate::utils::helpers::{normalize_whitespace, offset_from_minutes};
use crate::utils::logging::{log_business_rejection, log_session_transition};

#[derive(Clone)]
pub struct SessionService {
    db: DatabaseService,
    qr: QrTokenService,
    settings: Settings,
    clock: SharedClock,
}

impl SessionService {
    pub fn new(db: DatabaseService, qr: QrTokenService, settings: Settings, clock: SharedClock) -> Self {
        Self {
            db,
            qr,
            settings,
            clock,
        }
    }

    /// Create a PENDING session and store its admin-scoped QR token
    pub async fn create_session(
        &self,
        event_id: i64,
        name: &str,
        session_date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Result<EventSession> {
        if start_time >= end_time {
            return Err(OrgHubError::InvalidTimeRange {
                start: start_time,
                end: end_time,
            });
        }
        let name = normalize_whitespace(name);
        if name.is_empty() {
            return Err(OrgHubError::InvalidInput("Session name cannot be empty".to_string()));
        }

        let request = CreateSessionRequest {
            event_id,
            name,
            session_date,
            start_time,
            end_time,
        };

        let mut tx = self.db.begin().await?;
        match self.create_in_tx(&mut tx, &request).await {
            Ok(session) => {
                tx.commit().await?;
                info!(
                    session_id = session.id,
                    event_id = session.event_id,
                    session_date = %session.session_date,
                    "Session created"
                );
                Ok(session)
            }
            Err(e) => {
                DatabaseService::rollback(tx, "create_session").await;
                log_business_rejection("create_session", &e);
                Err(e)
            }
        }
    }

    async fn create_in_tx(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        request: &CreateSessionRequest,
    ) -> Result<EventSession> {
        if !EventRepository::event_exists(&mut **tx, request.event_id).await? {
            return Err(OrgHubError::EventNotFound {
                event_id: request.event_id,
            });
        }

        let session = SessionRepository::insert(&mut **tx, request, self.clock.now()).await?;
        let token = self.qr.issue_for_session(session.id)?;
        SessionRepository::set_qr_token(&mut **tx, session.id, &token, self.clock.now())
            .await?
            .ok_or(OrgHubError::SessionNotFound { session_id: session.id })
    }

    /// Move a session to `new_status` under the configured transition policy
    pub async fn set_status(&self, session_id: i64, new_status: SessionStatus) -> Result<EventSession> {
        let mut tx = self.db.begin().await?;
        match self.set_status_in_tx(&mut tx, session_id, new_status).await {
            Ok((previous, session)) => {
                tx.commit().await?;
                log_session_transition(session_id, previous.as_str(), session.status.as_str());
                Ok(session)
            }
            Err(e) => {
                DatabaseService::rollback(tx, "set_session_status").await;
                log_business_rejection("set_session_status", &e);
                Err(e)
            }
        }
    }

    /// Boundary form of [`set_status`](Self::set_status) taking the status name
    pub async fn set_status_str(&self, session_id: i64, new_status: &str) -> Result<EventSession> {
        let status: SessionStatus = new_status.parse()?;
        self.set_status(session_id, status).await
    }

    async fn set_status_in_tx(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        session_id: i64,
        new_status: SessionStatus,
    ) -> Result<(SessionStatus, EventSession)> {
        let current = SessionRepository::find_by_id_for_update(&mut **tx, session_id)
            .await?
            .ok_or(OrgHubError::SessionNotFound { session_id })?;

        if self.settings.attendance.strict_transitions && !current.status.can_transition_to(new_status) {
            return Err(OrgHubError::InvalidStateTransition {
                from: current.status,
                to: new_status,
            });
        }

        let updated = SessionRepository::update_status(&mut **tx, session_id, new_status, self.clock.now())
            .await?
            .ok_or(OrgHubError::SessionNotFound { session_id })?;

        Ok((current.status, updated))
    }

    /// ACTIVE and, in local time, today is the session date and now is
    /// strictly between start and end
    pub async fn is_active(&self, session_id: i64) -> Result<bool> {
        let session = self.get_session(session_id).await?;
        let offset = offset_from_minutes(self.settings.attendance.utc_offset_minutes);
        Ok(session.is_active_at(self.clock.now(), offset))
    }

    pub async fn get_session(&self, session_id: i64) -> Result<EventSession> {
        self.db
            .sessions
            .find_by_id(session_id)
            .await?
            .ok_or(OrgHubError::SessionNotFound { session_id })
    }

    pub async fn list_sessions_for_event(&self, event_id: i64) -> Result<Vec<EventSession>> {
        debug!(event_id = event_id, "Listing sessions for event");
        self.db.sessions.find_by_event_id(event_id).await
    }

    pub async fn list_sessions_for_event_on(&self, event_id: i64, date: NaiveDate) -> Result<Vec<EventSession>> {
        debug!(event_id = event_id, date = %date, "Listing sessions for event on date");
        self.db.sessions.find_by_event_id_and_date(event_id, date).await
    }

    /// Re-mint the admin-scoped token once the stored one has lapsed.
    /// A still-valid token is kept as is.
    pub async fn refresh_qr_token(&self, session_id: i64) -> Result<EventSession> {
        let session = self.get_session(session_id).await?;
        if let Some(current) = &session.qr_token_code {
            if !self.qr.codec().is_expired(current) {
                debug!(session_id = session_id, "Stored QR token still valid");
                return Ok(session);
            }
        }

        let token = self.qr.issue_for_session(session_id)?;
        let updated = SessionRepository::set_qr_token(self.db.pool(), session_id, &token, self.clock.now())
            .await?
            .ok_or(OrgHubError::SessionNotFound { session_id })?;
        info!(session_id = session_id, "Session QR token refreshed");
        Ok(updated)
    }
}
