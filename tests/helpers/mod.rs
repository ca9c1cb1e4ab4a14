//! Test helpers module
//!
//! Database setup and a fully wired service context for integration tests.

#![allow(dead_code)]

pub mod database_helper;
pub mod test_context;

pub use database_helper::*;
pub use test_context::*;
