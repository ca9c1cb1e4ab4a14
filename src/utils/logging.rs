//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the OrgHub attendance backend.

use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;
use crate::utils::errors::{OrgHubError, Result};

/// Initialize logging based on configuration
///
/// The returned guard flushes the file writer on drop and must be held for
/// the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(&config.level)
        .map_err(|e| OrgHubError::Config(format!("Invalid log filter '{}': {}", config.level, e)))?;

    let stdout_layer = if config.json {
        tracing_subscriber::fmt::layer().json().with_writer(std::io::stdout).boxed()
    } else {
        tracing_subscriber::fmt::layer().with_writer(std::io::stdout).boxed()
    };

    let (file_layer, guard) = match &config.file_path {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = tracing_appender::rolling::daily(dir, &config.file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(non_blocking)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| OrgHubError::Config(format!("Failed to install log subscriber: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log a recorded check-in
pub fn log_check_in(session_id: i64, student_id: &str, record_id: i64) {
    info!(
        session_id = session_id,
        student_id = student_id,
        record_id = record_id,
        "Attendance recorded"
    );
}

/// Log a session status change
pub fn log_session_transition(session_id: i64, from: &str, to: &str) {
    info!(
        session_id = session_id,
        from = from,
        to = to,
        "Session status changed"
    );
}

/// Log QR token issuance
pub fn log_token_issued(session_id: i64, student_id: Option<&str>, scope: &str) {
    debug!(
        session_id = session_id,
        student_id = student_id,
        scope = scope,
        "QR token issued"
    );
}

/// Log a business-rule rejection, or an operational fault at error level
pub fn log_business_rejection(operation: &str, error: &OrgHubError) {
    if error.is_business_rejection() {
        match error.severity() {
            crate::utils::errors::ErrorSeverity::Warning => warn!(
                operation = operation,
                code = error.code(),
                error = %error,
                "Request rejected"
            ),
            _ => info!(
                operation = operation,
                code = error.code(),
                error = %error,
                "Request rejected"
            ),
        }
    } else {
        error!(
            operation = operation,
            code = error.code(),
            severity = %error.severity(),
            error = %error,
            "Operational failure"
        );
    }
}

/// Log database operations
pub fn log_database_operation(operation: &str, table: &str, duration_ms: u64, success: bool) {
    if success {
        debug!(
            operation = operation,
            table = table,
            duration_ms = duration_ms,
            "Database operation completed"
        );
    } else {
        error!(
            operation = operation,
            table = table,
            duration_ms = duration_ms,
            "Database operation failed"
        );
    }
}
