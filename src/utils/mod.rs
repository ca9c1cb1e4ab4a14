//! Utility modules
//!
//! This module contains common utilities used throughout the application,
//! including error handling, logging setup, the clock abstraction and helper functions.

pub mod clock;
pub mod errors;
pub mod helpers;
pub mod logging;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use errors::{OrgHubError, RejectionReason, Result, TokenError};
