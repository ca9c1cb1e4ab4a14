//! Services module
//!
//! This module contains business logic services

pub mod attendance;
pub mod auth;
pub mod event;
pub mod qr;
pub mod session;
pub mod token;

// Re-export commonly used services
pub use attendance::AttendanceService;
pub use auth::{IdentityExtractor, JwtIdentityExtractor};
pub use event::EventService;
pub use qr::QrTokenService;
pub use session::SessionService;
pub use token::{Claims, TokenCodec, TokenConfig};

use std::sync::Arc;

use chrono::Duration;

use crate::config::settings::Settings;
use crate::database::{health_check, DatabaseService};
use crate::utils::clock::SharedClock;
use crate::utils::errors::Result;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub event_service: EventService,
    pub session_service: SessionService,
    pub qr_service: QrTokenService,
    pub attendance_service: AttendanceService,
    pub identity: Arc<dyn IdentityExtractor>,
    database: DatabaseService,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized, using
    /// access-token identity extraction
    pub fn new(settings: Settings, database: DatabaseService, clock: SharedClock) -> Result<Self> {
        let identity = Arc::new(JwtIdentityExtractor::from_settings(&settings, clock.clone()));
        Self::with_identity_extractor(settings, database, clock, identity)
    }

    /// Create a ServiceFactory around a caller-supplied identity extractor
    pub fn with_identity_extractor(
        settings: Settings,
        database: DatabaseService,
        clock: SharedClock,
        identity: Arc<dyn IdentityExtractor>,
    ) -> Result<Self> {
        settings.validate()?;

        let qr_codec = TokenCodec::new(
            TokenConfig {
                secret: settings.tokens.qr_secret.clone(),
                subject: token::QR_SUBJECT.to_string(),
                validity: Duration::hours(settings.tokens.qr_validity_hours),
            },
            clock.clone(),
        );

        let qr_service = QrTokenService::new(
            qr_codec.clone(),
            identity.clone(),
            database.sessions.clone(),
            database.events.clone(),
        );
        let event_service = EventService::new(database.clone(), clock.clone());
        let session_service = SessionService::new(
            database.clone(),
            qr_service.clone(),
            settings.clone(),
            clock.clone(),
        );
        let attendance_service = AttendanceService::new(database.clone(), qr_codec, settings, clock);

        Ok(Self {
            event_service,
            session_service,
            qr_service,
            attendance_service,
            identity,
            database,
        })
    }

    pub fn database(&self) -> &DatabaseService {
        &self.database
    }

    /// Health check for all services
    pub async fn health_check(&self) -> ServiceHealthStatus {
        let database_healthy = match health_check(self.database.pool()).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Database health check failed");
                false
            }
        };

        ServiceHealthStatus {
            database_healthy,
            token_signing_ready: self.qr_service.issue_for_session(0).is_ok(),
        }
    }
}

/// Health status for all services
#[derive(Debug, Clone)]
pub struct ServiceHealthStatus {
    pub database_healthy: bool,
    pub token_signing_ready: bool,
}

impl ServiceHealthStatus {
    /// Check if all critical services are healthy
    pub fn is_healthy(&self) -> bool {
        self.database_healthy && self.token_signing_ready
    }

    /// Get list of unhealthy services
    pub fn get_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !self.database_healthy {
            issues.push("Database connection failed".to_string());
        }
        if !self.token_signing_ready {
            issues.push("QR token signing failed".to_string());
        }

        issues
    }
}
