//! Event directory service
//!
//! Events, students and event registrations. Attendance is only ever recorded
//! for registered participants, so leaving an event is refused once the
//! student has checked in to any of its sessions.

use chrono::NaiveDate;
use sqlx::{Postgres, Transaction};
use tracing::{debug, info};

use crate::database::repositories::attendance::PARTICIPANT_FK_CONSTRAINT;
use crate::database::{AttendanceRepository, DatabaseService, EventRepository};
use crate::models::event::{CreateEventRequest, Event, EventParticipant, RegisterStudentRequest, Student};
use crate::utils::clock::SharedClock;
use crate::utils::errors::{OrgHubError, Result};
use crate::utils::helpers::normalize_whitespace;
use crate::utils::logging::log_business_rejection;

#[derive(Clone)]
pub struct EventService {
    db: DatabaseService,
    clock: SharedClock,
}

impl EventService {
    pub fn new(db: DatabaseService, clock: SharedClock) -> Self {
        Self { db, clock }
    }

    pub async fn create_event(&self, name: &str, event_date: NaiveDate) -> Result<Event> {
        let name = normalize_whitespace(name);
        if name.is_empty() {
            return Err(OrgHubError::InvalidInput("Event name cannot be empty".to_string()));
        }

        let event = self
            .db
            .events
            .create(
                CreateEventRequest {
                    name,
                    event_date,
                    status: None,
                },
                self.clock.now(),
            )
            .await?;
        info!(event_id = event.id, event_date = %event.event_date, "Event created");
        Ok(event)
    }

    pub async fn get_event(&self, event_id: i64) -> Result<Event> {
        self.db
            .events
            .find_by_id(event_id)
            .await?
            .ok_or(OrgHubError::EventNotFound { event_id })
    }

    pub async fn event_exists(&self, event_id: i64) -> Result<bool> {
        EventRepository::event_exists(self.db.pool(), event_id).await
    }

    /// Insert a student or refresh the stored name and email
    pub async fn register_student(&self, student_id: &str, full_name: &str, email: Option<&str>) -> Result<Student> {
        let student_id = student_id.trim();
        if student_id.is_empty() {
            return Err(OrgHubError::InvalidInput("Student id cannot be empty".to_string()));
        }
        let full_name = normalize_whitespace(full_name);
        if full_name.is_empty() {
            return Err(OrgHubError::InvalidInput("Student name cannot be empty".to_string()));
        }

        let student = self
            .db
            .events
            .upsert_student(
                RegisterStudentRequest {
                    student_id: student_id.to_string(),
                    full_name,
                    email: email.map(str::trim).filter(|e| !e.is_empty()).map(str::to_string),
                },
                self.clock.now(),
            )
            .await?;
        debug!(student_id = %student.student_id, "Student registered");
        Ok(student)
    }

    pub async fn join_event(&self, event_id: i64, student_id: &str) -> Result<EventParticipant> {
        let result = self.try_join_event(event_id, student_id).await;
        if let Err(e) = &result {
            log_business_rejection("join_event", e);
        }
        result
    }

    async fn try_join_event(&self, event_id: i64, student_id: &str) -> Result<EventParticipant> {
        if !self.event_exists(event_id).await? {
            return Err(OrgHubError::EventNotFound { event_id });
        }
        if self.db.events.find_student(student_id).await?.is_none() {
            return Err(OrgHubError::StudentNotFound {
                student_id: student_id.to_string(),
            });
        }
        if self.db.events.participant_exists(event_id, student_id).await? {
            return Err(OrgHubError::AlreadyParticipant {
                student_id: student_id.to_string(),
                event_id,
            });
        }

        let participant = match self.db.events.add_participant(event_id, student_id, self.clock.now()).await {
            Ok(participant) => participant,
            // Lost a race against a concurrent join
            Err(OrgHubError::Database(sqlx::Error::Database(db_err))) if db_err.is_unique_violation() => {
                return Err(OrgHubError::AlreadyParticipant {
                    student_id: student_id.to_string(),
                    event_id,
                });
            }
            Err(e) => return Err(e),
        };

        info!(event_id = event_id, student_id = student_id, participant_id = participant.id, "Student joined event");
        Ok(participant)
    }

    /// Withdraw a registration that has no attendance behind it
    pub async fn leave_event(&self, event_id: i64, student_id: &str) -> Result<()> {
        let mut tx = self.db.begin().await?;
        match Self::leave_in_tx(&mut tx, event_id, student_id).await {
            Ok(()) => {
                tx.commit().await?;
                info!(event_id = event_id, student_id = student_id, "Student left event");
                Ok(())
            }
            Err(e) => {
                DatabaseService::rollback(tx, "leave_event").await;
                log_business_rejection("leave_event", &e);
                Err(e)
            }
        }
    }

    async fn leave_in_tx(tx: &mut Transaction<'static, Postgres>, event_id: i64, student_id: &str) -> Result<()> {
        let participant = EventRepository::find_participant_for_update(&mut **tx, event_id, student_id)
            .await?
            .ok_or_else(|| OrgHubError::StudentNotParticipant {
                student_id: student_id.to_string(),
                event_id,
            })?;

        let already_recorded = || OrgHubError::AttendanceAlreadyRecorded {
            student_id: student_id.to_string(),
            event_id,
        };
        if AttendanceRepository::exists_by_participant(&mut **tx, participant.id).await? {
            return Err(already_recorded());
        }

        match EventRepository::remove_participant(&mut **tx, participant.id).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_foreign_key_violation_on(PARTICIPANT_FK_CONSTRAINT) => Err(already_recorded()),
            Err(e) => Err(e),
        }
    }

    pub async fn participant_exists(&self, event_id: i64, student_id: &str) -> Result<bool> {
        self.db.events.participant_exists(event_id, student_id).await
    }

    pub async fn list_participants(&self, event_id: i64) -> Result<Vec<EventParticipant>> {
        self.db.events.get_participants(event_id).await
    }
}
