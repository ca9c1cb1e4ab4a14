//! Caller identity extraction
//!
//! The check-in token issuer never parses caller credentials itself. It asks an
//! [`IdentityExtractor`] for the student id behind a credential; the default
//! implementation reads HS256 access tokens signed with the identity secret.

use chrono::Duration;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::settings::Settings;
use crate::services::token::{TokenCodec, TokenConfig, ACCESS_SUBJECT, CLAIM_STUDENT_ID};
use crate::utils::clock::SharedClock;
use crate::utils::errors::Result;

/// Resolves the authenticated student behind a caller credential
pub trait IdentityExtractor: Send + Sync {
    /// `None` when the credential is invalid, expired or carries no student id
    fn extract_student_id(&self, credential: &str) -> Option<String>;
}

/// Access-token backed identity extraction
#[derive(Debug, Clone)]
pub struct JwtIdentityExtractor {
    codec: TokenCodec,
}

impl JwtIdentityExtractor {
    pub fn new(secret: String, validity: Duration, clock: SharedClock) -> Self {
        let codec = TokenCodec::new(
            TokenConfig {
                secret,
                subject: ACCESS_SUBJECT.to_string(),
                validity,
            },
            clock,
        );
        Self { codec }
    }

    pub fn from_settings(settings: &Settings, clock: SharedClock) -> Self {
        Self::new(
            settings.tokens.identity_secret.clone(),
            Duration::minutes(settings.tokens.access_validity_minutes),
            clock,
        )
    }

    /// Mint an access credential for a student
    pub fn issue_access_token(&self, student_id: &str) -> Result<String> {
        let mut claims = Map::new();
        claims.insert(CLAIM_STUDENT_ID.to_string(), Value::from(student_id));
        self.codec.issue_default(claims)
    }
}

impl IdentityExtractor for JwtIdentityExtractor {
    fn extract_student_id(&self, credential: &str) -> Option<String> {
        let credential = credential.trim();
        let credential = credential.strip_prefix("Bearer ").unwrap_or(credential);

        let claims = match self.codec.verify(credential) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "Rejected access credential");
                return None;
            }
        };

        if self.codec.claims_expired(&claims) {
            debug!("Access credential expired");
            return None;
        }

        claims
            .get_str(CLAIM_STUDENT_ID)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::token::QR_SUBJECT;
    use crate::utils::clock::ManualClock;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    const SECRET: &str = "identity-secret-with-at-least-32-bytes";

    fn extractor(clock: &ManualClock) -> JwtIdentityExtractor {
        JwtIdentityExtractor::new(SECRET.to_string(), Duration::minutes(60), Arc::new(clock.clone()))
    }

    fn clock() -> ManualClock {
        ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap())
    }

    #[test]
    fn test_extracts_student_id() {
        let clock = clock();
        let extractor = extractor(&clock);
        let token = extractor.issue_access_token("S-1001").unwrap();

        assert_eq!(extractor.extract_student_id(&token), Some("S-1001".to_string()));
        assert_eq!(
            extractor.extract_student_id(&format!("Bearer {}", token)),
            Some("S-1001".to_string())
        );
    }

    #[test]
    fn test_expired_credential_is_rejected() {
        let clock = clock();
        let extractor = extractor(&clock);
        let token = extractor.issue_access_token("S-1001").unwrap();

        clock.advance(Duration::minutes(61));
        assert_eq!(extractor.extract_student_id(&token), None);
    }

    #[test]
    fn test_qr_token_is_not_a_credential() {
        let clock = clock();
        let extractor = extractor(&clock);
        let qr = TokenCodec::new(
            TokenConfig {
                secret: SECRET.to_string(),
                subject: QR_SUBJECT.to_string(),
                validity: Duration::hours(24),
            },
            Arc::new(clock.clone()),
        );
        let mut claims = Map::new();
        claims.insert(CLAIM_STUDENT_ID.to_string(), Value::from("S-1001"));
        let token = qr.issue_default(claims).unwrap();

        assert_eq!(extractor.extract_student_id(&token), None);
    }

    #[test]
    fn test_garbage_and_blank_ids() {
        let clock = clock();
        let extractor = extractor(&clock);

        assert_eq!(extractor.extract_student_id("garbage"), None);

        let blank = extractor.issue_access_token("   ").unwrap();
        assert_eq!(extractor.extract_student_id(&blank), None);
    }
}
