//! Test context for unified test setup
//!
//! Wires a test database, deterministic clock and the full service graph.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use std::sync::Arc;

use OrgHub::config::Settings;
use OrgHub::database::DatabaseService;
use OrgHub::models::{EventSession, SessionStatus};
use OrgHub::services::{JwtIdentityExtractor, ServiceFactory};
use OrgHub::utils::clock::ManualClock;

use super::database_helper::TestDatabase;

pub const QR_SECRET: &str = "qr-secret-for-integration-tests-0001";
pub const IDENTITY_SECRET: &str = "identity-secret-for-integration-tests";

/// 2026-03-10, the day every scheduled test session runs
pub fn session_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
}

pub fn at(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

/// 10:30 UTC on the session day, inside a 10:00-11:00 session
pub fn default_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 10, 30, 0).unwrap()
}

/// Unified test context that manages all test components
pub struct TestContext {
    pub database: TestDatabase,
    pub settings: Settings,
    pub clock: ManualClock,
    pub services: ServiceFactory,
    pub identity: JwtIdentityExtractor,
}

impl TestContext {
    /// Default policy; `None` only when database tests are opted out
    pub async fn try_new() -> Option<Self> {
        Self::try_new_with(|_| {}).await
    }

    /// Adjust settings before the services are built
    pub async fn try_new_with(configure: impl FnOnce(&mut Settings)) -> Option<Self> {
        let database = TestDatabase::try_new().await?;

        let mut settings = Settings::default();
        settings.database.url = database.database_url.clone();
        settings.database.max_connections = 10;
        settings.tokens.qr_secret = QR_SECRET.to_string();
        settings.tokens.identity_secret = IDENTITY_SECRET.to_string();
        settings.logging.level = "debug".to_string();
        configure(&mut settings);

        let clock = ManualClock::new(default_now());
        let identity = JwtIdentityExtractor::from_settings(&settings, Arc::new(clock.clone()));
        let services = ServiceFactory::new(
            settings.clone(),
            DatabaseService::new(database.pool.clone()),
            Arc::new(clock.clone()),
        )
        .expect("Failed to build services");

        Some(Self {
            database,
            settings,
            clock,
            services,
            identity,
        })
    }

    /// Access credential for a student, as the identity provider would mint it
    pub fn credential_for(&self, student_id: &str) -> String {
        self.identity
            .issue_access_token(student_id)
            .expect("Failed to issue access token")
    }

    /// Event with one 10:00-11:00 session on the session day
    pub async fn event_with_session(&self, status: SessionStatus) -> (i64, EventSession) {
        let event = self
            .services
            .event_service
            .create_event("Systems Programming", session_day())
            .await
            .expect("Failed to create event");

        let session = self
            .services
            .session_service
            .create_session(event.id, "Week 1 lab", session_day(), at(10, 0), at(11, 0))
            .await
            .expect("Failed to create session");

        let session = match status {
            SessionStatus::Pending => session,
            SessionStatus::Active => self.activate(session.id).await,
            SessionStatus::Completed => {
                self.activate(session.id).await;
                self.services
                    .session_service
                    .set_status(session.id, SessionStatus::Completed)
                    .await
                    .expect("Failed to complete session")
            }
        };

        (event.id, session)
    }

    pub async fn activate(&self, session_id: i64) -> EventSession {
        self.services
            .session_service
            .set_status(session_id, SessionStatus::Active)
            .await
            .expect("Failed to activate session")
    }

    /// Register a student and add them to the event
    pub async fn enroll(&self, event_id: i64, student_id: &str, full_name: &str) {
        self.services
            .event_service
            .register_student(student_id, full_name, None)
            .await
            .expect("Failed to register student");
        self.services
            .event_service
            .join_event(event_id, student_id)
            .await
            .expect("Failed to join event");
    }

    /// Student-scoped check-in token obtained through the public issuer
    pub async fn student_token(&self, session_id: i64, student_id: &str) -> String {
        let credential = self.credential_for(student_id);
        self.services
            .qr_service
            .issue_for_student_check_in(session_id, &credential)
            .await
            .expect("Failed to issue check-in token")
    }

    /// Registration row id of a student in an event
    pub async fn participant_id(&self, event_id: i64, student_id: &str) -> i64 {
        sqlx::query_scalar("SELECT id FROM event_participants WHERE event_id = $1 AND student_id = $2")
            .bind(event_id)
            .bind(student_id)
            .fetch_one(self.db_pool())
            .await
            .expect("Failed to look up participant")
    }

    /// Clean up all test data
    pub async fn cleanup(&self) -> Result<(), sqlx::Error> {
        self.database.cleanup().await
    }

    /// Get database pool for direct access
    pub fn db_pool(&self) -> &sqlx::PgPool {
        &self.database.pool
    }
}
