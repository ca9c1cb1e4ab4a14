//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub tokens: TokenSettings,
    pub attendance: AttendanceConfig,
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub run_migrations: bool,
}

/// Signing keys and lifetimes for the tokens the backend issues
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenSettings {
    /// HMAC secret for session check-in QR tokens
    pub qr_secret: String,
    /// Validity window of every QR token, in hours
    pub qr_validity_hours: i64,
    /// HMAC secret for student access credentials
    pub identity_secret: String,
    /// Lifetime of access credentials minted by this service, in minutes
    pub access_validity_minutes: i64,
}

/// Check-in policy knobs
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AttendanceConfig {
    /// Only allow PENDING -> ACTIVE -> COMPLETED (and ACTIVE -> PENDING)
    pub strict_transitions: bool,
    /// Reject check-ins outside the session's date and start/end times
    pub enforce_time_window: bool,
    /// Reject tokens whose sessionId claim differs from the target session
    pub require_session_claim_match: bool,
    /// Offset of the organization's local time from UTC, in minutes
    pub utc_offset_minutes: i32,
    pub default_page_size: u32,
    pub max_page_size: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for the rolling log file; stdout only when unset
    pub file_path: Option<String>,
    pub file_name: String,
    pub json: bool,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    ///
    /// Later sources win: built-in defaults, then `config.toml`, then
    /// `ORGHUB__SECTION__KEY` environment variables.
    pub fn new() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Load settings using a specific configuration file stem
    pub fn load_from(file_stem: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Settings::default())?)
            .add_source(config::File::with_name(file_stem).required(false))
            .add_source(
                config::Environment::with_prefix("ORGHUB")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::OrgHubError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "postgresql://localhost/orghub".to_string(),
                max_connections: 10,
                min_connections: 1,
                acquire_timeout_seconds: 30,
                run_migrations: true,
            },
            tokens: TokenSettings {
                qr_secret: String::new(),
                qr_validity_hours: 24,
                identity_secret: String::new(),
                access_validity_minutes: 60,
            },
            attendance: AttendanceConfig {
                strict_transitions: true,
                enforce_time_window: true,
                require_session_claim_match: true,
                utc_offset_minutes: 0,
                default_page_size: 20,
                max_page_size: 100,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                file_name: "orghub.log".to_string(),
                json: false,
            },
        }
    }
}
