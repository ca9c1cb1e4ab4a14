//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use super::Settings;
use crate::utils::errors::{OrgHubError, Result};

/// Shortest accepted HMAC secret, in bytes
pub const MIN_SECRET_LENGTH: usize = 32;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_database_config(&settings.database)?;
    validate_token_settings(&settings.tokens)?;
    validate_attendance_config(&settings.attendance)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(OrgHubError::Config("Database URL is required".to_string()));
    }

    if config.max_connections == 0 {
        return Err(OrgHubError::Config(
            "Max connections must be greater than 0".to_string(),
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(OrgHubError::Config(
            "Min connections cannot be greater than max connections".to_string(),
        ));
    }

    Ok(())
}

/// Validate token secrets and lifetimes
fn validate_token_settings(config: &super::TokenSettings) -> Result<()> {
    if config.qr_secret.len() < MIN_SECRET_LENGTH {
        return Err(OrgHubError::Config(format!(
            "QR token secret must be at least {} bytes",
            MIN_SECRET_LENGTH
        )));
    }

    if config.identity_secret.len() < MIN_SECRET_LENGTH {
        return Err(OrgHubError::Config(format!(
            "Identity secret must be at least {} bytes",
            MIN_SECRET_LENGTH
        )));
    }

    if config.qr_validity_hours <= 0 {
        return Err(OrgHubError::Config(
            "QR token validity must be greater than 0 hours".to_string(),
        ));
    }

    if config.access_validity_minutes <= 0 {
        return Err(OrgHubError::Config(
            "Access credential validity must be greater than 0 minutes".to_string(),
        ));
    }

    Ok(())
}

/// Validate attendance policy configuration
fn validate_attendance_config(config: &super::AttendanceConfig) -> Result<()> {
    if config.utc_offset_minutes.abs() >= 24 * 60 {
        return Err(OrgHubError::Config(format!(
            "UTC offset out of range: {} minutes",
            config.utc_offset_minutes
        )));
    }

    if config.default_page_size == 0 || config.max_page_size == 0 {
        return Err(OrgHubError::Config(
            "Page sizes must be greater than 0".to_string(),
        ));
    }

    if config.default_page_size > config.max_page_size {
        return Err(OrgHubError::Config(
            "Default page size cannot exceed max page size".to_string(),
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(OrgHubError::Config("Log level is required".to_string()));
    }

    EnvFilter::try_new(&config.level).map_err(|e| {
        OrgHubError::Config(format!("Invalid log filter '{}': {}", config.level, e))
    })?;

    // A bare word parses as a target directive; it must be a level here
    for directive in config.level.split(',').map(str::trim).filter(|d| !d.is_empty()) {
        if !directive.contains('=') && !directive.contains('[') && directive.parse::<LevelFilter>().is_err() {
            return Err(OrgHubError::Config(format!(
                "Invalid log level '{}' in filter '{}'",
                directive, config.level
            )));
        }
    }

    if config.file_name.is_empty() {
        return Err(OrgHubError::Config("Log file name is required".to_string()));
    }

    Ok(())
}
