//! Check-in pipeline and attendance queries
//!
//! A check-in is validated in a fixed order and the first failing rule decides
//! the rejection. Token checks run before any database access; everything from
//! the session lookup to the insert runs in one transaction with the session
//! row share-locked, so a concurrent status change cannot slip in between the
//! ACTIVE check and the write.

use sqlx::{Postgres, Transaction};
use tracing::debug;

use crate::config::settings::Settings;
use crate::database::repositories::attendance::PARTICIPANT_FK_CONSTRAINT;
use crate::database::{AttendanceRepository, DatabaseService, EventRepository, SessionRepository};
use crate::models::attendance::{
    AttendanceEntry, AttendanceFilter, AttendanceRecord, AttendanceSort, NewAttendanceRecord,
    SessionAttendanceSummary,
};
use crate::models::page::{Page, PageRequest};
use crate::models::session::SessionStatus;
use crate::services::token::{TokenCodec, CLAIM_SESSION_ID, CLAIM_STUDENT_ID};
use crate::utils::clock::SharedClock;
use crate::utils::errors::{OrgHubError, RejectionReason, Result};
use crate::utils::helpers::offset_from_minutes;
use crate::utils::logging::{log_business_rejection, log_check_in};

#[derive(Clone)]
pub struct AttendanceService {
    db: DatabaseService,
    codec: TokenCodec,
    settings: Settings,
    clock: SharedClock,
}

impl AttendanceService {
    pub fn new(db: DatabaseService, codec: TokenCodec, settings: Settings, clock: SharedClock) -> Self {
        Self {
            db,
            codec,
            settings,
            clock,
        }
    }

    /// Validate a student-scoped QR token and record attendance exactly once
    pub async fn check_in(&self, session_id: i64, qr_token: &str) -> Result<AttendanceRecord> {
        let result = self.run_check_in(session_id, qr_token).await;
        if let Err(e) = &result {
            log_business_rejection("check_in", e);
        }
        result
    }

    async fn run_check_in(&self, session_id: i64, qr_token: &str) -> Result<AttendanceRecord> {
        let claims = self
            .codec
            .verify(qr_token)
            .map_err(|e| {
                debug!(session_id = session_id, error = %e, "QR token failed verification");
                OrgHubError::InvalidQrToken(RejectionReason::Tampered)
            })?;

        if self.codec.claims_expired(&claims) {
            return Err(OrgHubError::InvalidQrToken(RejectionReason::Expired));
        }

        let student_id = claims
            .get_str(CLAIM_STUDENT_ID)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or(OrgHubError::InvalidQrToken(RejectionReason::MissingStudentClaim))?;

        if self.settings.attendance.require_session_claim_match
            && claims.get_i64(CLAIM_SESSION_ID) != Some(session_id)
        {
            return Err(OrgHubError::InvalidQrToken(RejectionReason::SessionMismatch));
        }

        let mut tx = self.db.begin().await?;
        match self.record_in_tx(&mut tx, session_id, &student_id, qr_token).await {
            Ok(record) => {
                tx.commit().await?;
                log_check_in(session_id, &student_id, record.id);
                Ok(record)
            }
            Err(e) => {
                DatabaseService::rollback(tx, "check_in").await;
                Err(e)
            }
        }
    }

    async fn record_in_tx(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        session_id: i64,
        student_id: &str,
        qr_token: &str,
    ) -> Result<AttendanceRecord> {
        let session = SessionRepository::find_by_id_for_share(&mut **tx, session_id)
            .await?
            .ok_or(OrgHubError::SessionNotFound { session_id })?;

        if session.status != SessionStatus::Active {
            return Err(OrgHubError::SessionNotActive {
                session_id,
                status: session.status,
            });
        }

        let now = self.clock.now();
        if self.settings.attendance.enforce_time_window {
            let offset = offset_from_minutes(self.settings.attendance.utc_offset_minutes);
            if !session.is_within_window(now, offset) {
                return Err(OrgHubError::SessionOutsideWindow { session_id });
            }
        }

        let not_participant = || OrgHubError::StudentNotParticipant {
            student_id: student_id.to_string(),
            event_id: session.event_id,
        };
        let participant = EventRepository::find_participant_for_share(&mut **tx, session.event_id, student_id)
            .await?
            .ok_or_else(not_participant)?;

        if AttendanceRepository::exists_by_participant_and_session(&mut **tx, participant.id, session_id).await? {
            return Err(OrgHubError::DuplicateCheckIn {
                participant_id: participant.id,
                session_id,
            });
        }

        let record = NewAttendanceRecord {
            event_participant_id: participant.id,
            event_session_id: session_id,
            checked_in_at: now,
            qr_token_used: qr_token.to_string(),
        };
        match AttendanceRepository::insert(&mut **tx, &record).await {
            Err(e) if e.is_foreign_key_violation_on(PARTICIPANT_FK_CONSTRAINT) => Err(not_participant()),
            result => result,
        }
    }

    fn page_request(&self, page: u32, page_size: u32) -> PageRequest {
        let page_size = if page_size == 0 {
            self.settings.attendance.default_page_size
        } else {
            page_size
        };
        PageRequest::new(page, page_size).normalized(self.settings.attendance.max_page_size)
    }

    /// Attendance of one session, earliest check-in first
    pub async fn list_for_session(&self, session_id: i64, page: u32, page_size: u32) -> Result<Page<AttendanceEntry>> {
        let request = self.page_request(page, page_size);
        self.db.attendance.find_by_session_id(session_id, request).await
    }

    pub async fn count_for_session(&self, session_id: i64) -> Result<i64> {
        self.db.attendance.count_by_session_id(session_id).await
    }

    pub async fn list_for_student_in_event(&self, student_id: &str, event_id: i64) -> Result<Vec<AttendanceEntry>> {
        self.db.attendance.find_by_student_and_event(student_id, event_id).await
    }

    pub async fn search(
        &self,
        filter: &AttendanceFilter,
        sort: AttendanceSort,
        page: u32,
        page_size: u32,
    ) -> Result<Page<AttendanceEntry>> {
        if let (Some(from), Some(to)) = (filter.checked_in_from, filter.checked_in_to) {
            if from > to {
                return Err(OrgHubError::InvalidInput(
                    "checkedInFrom must not be after checkedInTo".to_string(),
                ));
            }
        }
        let request = self.page_request(page, page_size);
        self.db.attendance.search(filter, sort, request).await
    }

    pub async fn get_record(&self, record_id: i64) -> Result<Option<AttendanceRecord>> {
        self.db.attendance.find_by_id(record_id).await
    }

    /// Registered participants of the session's event against check-ins
    pub async fn session_summary(&self, session_id: i64) -> Result<SessionAttendanceSummary> {
        let session = self
            .db
            .sessions
            .find_by_id(session_id)
            .await?
            .ok_or(OrgHubError::SessionNotFound { session_id })?;

        let participants = self.db.events.get_participant_count(session.event_id).await?;
        let attended = self.db.attendance.count_by_session_id(session_id).await?;

        Ok(SessionAttendanceSummary {
            session_id,
            participants,
            attended,
        })
    }
}
