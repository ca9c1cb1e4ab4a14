//! Error handling for OrgHub
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy. Business-rule rejections
//! (expired token, duplicate check-in, ...) and operational faults share one
//! enum, but every variant carries a stable code so callers can tell them apart.

use chrono::NaiveTime;
use thiserror::Error;

use crate::models::session::SessionStatus;

/// Main error type for OrgHub application
#[derive(Error, Debug)]
pub enum OrgHubError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Token signing error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid QR token: {0}")]
    InvalidQrToken(RejectionReason),

    #[error("Could not extract a student identity from the supplied credential")]
    IdentityExtractionFailed,

    #[error("Event not found: {event_id}")]
    EventNotFound { event_id: i64 },

    #[error("Student not found: {student_id}")]
    StudentNotFound { student_id: String },

    #[error("Session not found: {session_id}")]
    SessionNotFound { session_id: i64 },

    #[error("Session {session_id} is not active (status: {status})")]
    SessionNotActive { session_id: i64, status: SessionStatus },

    #[error("Session {session_id} is outside its scheduled time window")]
    SessionOutsideWindow { session_id: i64 },

    #[error("Student {student_id} is not a participant of event {event_id}")]
    StudentNotParticipant { student_id: String, event_id: i64 },

    #[error("Student {student_id} must join event {event_id} before requesting a check-in token")]
    NotAParticipant { student_id: String, event_id: i64 },

    #[error("Participant {participant_id} has already checked in to session {session_id}")]
    DuplicateCheckIn { participant_id: i64, session_id: i64 },

    #[error("Invalid time range: start {start} must be before end {end}")]
    InvalidTimeRange { start: NaiveTime, end: NaiveTime },

    #[error("Invalid session status: {0}")]
    InvalidStatus(String),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: SessionStatus, to: SessionStatus },

    #[error("Student {student_id} is already a participant of event {event_id}")]
    AlreadyParticipant { student_id: String, event_id: i64 },

    #[error("Student {student_id} already has attendance recorded for event {event_id}")]
    AttendanceAlreadyRecorded { student_id: String, event_id: i64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Why a presented QR token was refused by the check-in pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    Tampered,
    Expired,
    MissingStudentClaim,
    SessionMismatch,
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectionReason::Tampered => write!(f, "tampered"),
            RejectionReason::Expired => write!(f, "expired, request a new token"),
            RejectionReason::MissingStudentClaim => write!(f, "missing student claim"),
            RejectionReason::SessionMismatch => write!(f, "issued for a different session"),
        }
    }
}

/// Signed token verification errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Token signature does not match")]
    BadSignature,

    #[error("Unsupported token algorithm")]
    UnsupportedAlgorithm,

    #[error("Token was issued for a different purpose")]
    WrongSubject,

    #[error("Token is missing required claim: {0}")]
    MissingClaim(String),
}

/// Result type alias for OrgHub operations
pub type Result<T> = std::result::Result<T, OrgHubError>;

/// Result type alias for token verification
pub type TokenResult<T> = std::result::Result<T, TokenError>;

impl OrgHubError {
    /// Foreign key violation on the named constraint
    pub fn is_foreign_key_violation_on(&self, constraint: &str) -> bool {
        match self {
            OrgHubError::Database(sqlx::Error::Database(db_err)) => {
                db_err.is_foreign_key_violation() && db_err.constraint() == Some(constraint)
            }
            _ => false,
        }
    }

    /// Stable machine-readable code for clients
    pub fn code(&self) -> &'static str {
        match self {
            OrgHubError::Database(_) => "INTERNAL_ERROR",
            OrgHubError::Migration(_) => "INTERNAL_ERROR",
            OrgHubError::Config(_) => "CONFIGURATION_ERROR",
            OrgHubError::Token(_) => "INTERNAL_ERROR",
            OrgHubError::Serialization(_) => "INTERNAL_ERROR",
            OrgHubError::Io(_) => "INTERNAL_ERROR",
            OrgHubError::InvalidQrToken(reason) => match reason {
                RejectionReason::Tampered => "QR_TOKEN_INVALID",
                RejectionReason::Expired => "QR_TOKEN_EXPIRED",
                RejectionReason::MissingStudentClaim => "QR_TOKEN_MISSING_STUDENT",
                RejectionReason::SessionMismatch => "QR_TOKEN_SESSION_MISMATCH",
            },
            OrgHubError::IdentityExtractionFailed => "IDENTITY_EXTRACTION_FAILED",
            OrgHubError::EventNotFound { .. } => "EVENT_NOT_FOUND",
            OrgHubError::StudentNotFound { .. } => "STUDENT_NOT_FOUND",
            OrgHubError::SessionNotFound { .. } => "SESSION_NOT_FOUND",
            OrgHubError::SessionNotActive { .. } => "SESSION_NOT_ACTIVE",
            OrgHubError::SessionOutsideWindow { .. } => "SESSION_OUTSIDE_WINDOW",
            OrgHubError::StudentNotParticipant { .. } => "STUDENT_NOT_PARTICIPANT",
            OrgHubError::NotAParticipant { .. } => "NOT_A_PARTICIPANT",
            OrgHubError::DuplicateCheckIn { .. } => "DUPLICATE_CHECK_IN",
            OrgHubError::InvalidTimeRange { .. } => "INVALID_TIME_RANGE",
            OrgHubError::InvalidStatus(_) => "INVALID_STATUS",
            OrgHubError::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            OrgHubError::AlreadyParticipant { .. } => "ALREADY_PARTICIPANT",
            OrgHubError::AttendanceAlreadyRecorded { .. } => "ATTENDANCE_ALREADY_RECORDED",
            OrgHubError::InvalidInput(_) => "INVALID_INPUT",
        }
    }

    /// True for expected, user-facing rejections; false for operational faults
    pub fn is_business_rejection(&self) -> bool {
        !matches!(
            self,
            OrgHubError::Database(_)
                | OrgHubError::Migration(_)
                | OrgHubError::Config(_)
                | OrgHubError::Token(_)
                | OrgHubError::Serialization(_)
                | OrgHubError::Io(_)
        )
    }

    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            OrgHubError::Database(_) => true,
            OrgHubError::Io(_) => true,
            // A fresh token fixes an expired one; nothing else is worth a retry.
            OrgHubError::InvalidQrToken(RejectionReason::Expired) => true,
            _ => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            OrgHubError::Database(_) => ErrorSeverity::Critical,
            OrgHubError::Migration(_) => ErrorSeverity::Critical,
            OrgHubError::Config(_) => ErrorSeverity::Critical,
            OrgHubError::Token(_) | OrgHubError::Serialization(_) | OrgHubError::Io(_) => {
                ErrorSeverity::Error
            }
            OrgHubError::InvalidQrToken(RejectionReason::Tampered) => ErrorSeverity::Warning,
            OrgHubError::InvalidQrToken(RejectionReason::SessionMismatch) => ErrorSeverity::Warning,
            OrgHubError::IdentityExtractionFailed => ErrorSeverity::Warning,
            _ => ErrorSeverity::Info,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
