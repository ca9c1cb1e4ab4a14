//! OrgHub attendance core
//!
//! Event sessions, signed QR check-in tokens and an append-only attendance
//! ledger on Postgres. This library provides the services behind session
//! management, token issuance and check-in, plus the configuration, logging
//! and persistence wiring they run on.

#![allow(non_snake_case)]

pub mod config;
pub mod database;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{OrgHubError, RejectionReason, Result, TokenError};

// Re-export main components for easy access
pub use database::DatabaseService;
pub use services::ServiceFactory;
pub use utils::clock::{Clock, ManualClock, SharedClock, SystemClock};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
