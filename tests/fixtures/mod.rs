//! Test fixtures and data for integration tests

#![allow(dead_code)]

use chrono::Duration;
use fake::faker::name::en::Name;
use fake::Fake;
use serde_json::{Map, Value};
use std::sync::Arc;

use OrgHub::services::token::{TokenCodec, TokenConfig, CLAIM_SESSION_ID, CLAIM_STUDENT_ID, QR_SUBJECT};
use OrgHub::utils::clock::ManualClock;

/// A student to enroll
#[derive(Debug, Clone)]
pub struct TestStudent {
    pub student_id: String,
    pub full_name: String,
}

impl TestStudent {
    pub fn new(student_id: &str, full_name: &str) -> Self {
        Self {
            student_id: student_id.to_string(),
            full_name: full_name.to_string(),
        }
    }
}

/// `count` students with sequential ids and generated names
pub fn roster(count: usize) -> Vec<TestStudent> {
    (1..=count)
        .map(|n| TestStudent {
            student_id: format!("S-{:04}", n),
            full_name: Name().fake(),
        })
        .collect()
}

/// QR codec sharing the service secret, for crafting tokens the issuer would refuse to mint
pub fn forging_codec(secret: &str, clock: &ManualClock) -> TokenCodec {
    TokenCodec::new(
        TokenConfig {
            secret: secret.to_string(),
            subject: QR_SUBJECT.to_string(),
            validity: Duration::hours(24),
        },
        Arc::new(clock.clone()),
    )
}

pub fn qr_claims(session_id: Option<i64>, student_id: Option<&str>) -> Map<String, Value> {
    let mut claims = Map::new();
    if let Some(session_id) = session_id {
        claims.insert(CLAIM_SESSION_ID.to_string(), Value::from(session_id));
    }
    if let Some(student_id) = student_id {
        claims.insert(CLAIM_STUDENT_ID.to_string(), Value::from(student_id));
    }
    claims
}
