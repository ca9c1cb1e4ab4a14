//! QR check-in token issuance
//!
//! Two flavours share one codec: admin-scoped tokens carry only `sessionId`
//! and are displayed for the room; student-scoped tokens add `studentId` and
//! are the only ones the check-in pipeline accepts.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::database::{EventRepository, SessionRepository};
use crate::services::auth::IdentityExtractor;
use crate::services::token::{TokenCodec, CLAIM_SESSION_ID, CLAIM_STUDENT_ID};
use crate::utils::errors::{OrgHubError, Result};
use crate::utils::logging::{log_business_rejection, log_token_issued};

#[derive(Clone)]
pub struct QrTokenService {
    codec: TokenCodec,
    identity: Arc<dyn IdentityExtractor>,
    sessions: SessionRepository,
    events: EventRepository,
}

impl QrTokenService {
    pub fn new(
        codec: TokenCodec,
        identity: Arc<dyn IdentityExtractor>,
        sessions: SessionRepository,
        events: EventRepository,
    ) -> Self {
        Self {
            codec,
            identity,
            sessions,
            events,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Admin-scoped token for a session
    pub fn issue_for_session(&self, session_id: i64) -> Result<String> {
        let mut claims = Map::new();
        claims.insert(CLAIM_SESSION_ID.to_string(), Value::from(session_id));

        let token = self.codec.issue_default(claims)?;
        log_token_issued(session_id, None, "session");
        Ok(token)
    }

    /// Student-scoped token, bound to the caller behind `credential`
    pub async fn issue_for_student_check_in(&self, session_id: i64, credential: &str) -> Result<String> {
        let result = self.try_issue_for_student(session_id, credential).await;
        if let Err(e) = &result {
            log_business_rejection("issue_check_in_token", e);
        }
        result
    }

    async fn try_issue_for_student(&self, session_id: i64, credential: &str) -> Result<String> {
        let student_id = self
            .identity
            .extract_student_id(credential)
            .ok_or(OrgHubError::IdentityExtractionFailed)?;

        let session = self
            .sessions
            .find_by_id(session_id)
            .await?
            .ok_or(OrgHubError::SessionNotFound { session_id })?;

        if !self.events.participant_exists(session.event_id, &student_id).await? {
            return Err(OrgHubError::NotAParticipant {
                student_id,
                event_id: session.event_id,
            });
        }

        let mut claims = Map::new();
        claims.insert(CLAIM_SESSION_ID.to_string(), Value::from(session_id));
        claims.insert(CLAIM_STUDENT_ID.to_string(), Value::from(student_id.clone()));

        let token = self.codec.issue_default(claims)?;
        log_token_issued(session_id, Some(&student_id), "student");
        Ok(token)
    }

    /// Session id carried by a verifiable token
    pub fn extract_session_id(&self, token: &str) -> Option<i64> {
        match self.codec.verify(token) {
            Ok(claims) => claims.get_i64(CLAIM_SESSION_ID),
            Err(e) => {
                debug!(error = %e, "Could not read session id from token");
                None
            }
        }
    }

    /// Student id carried by a verifiable token
    pub fn extract_student_id(&self, token: &str) -> Option<String> {
        match self.codec.verify(token) {
            Ok(claims) => claims.get_str(CLAIM_STUDENT_ID).map(str::to_string),
            Err(e) => {
                debug!(error = %e, "Could not read student id from token");
                None
            }
        }
    }
}
