//! Signed token codec
//!
//! HS256 JWTs over a flat claim map. Every codec is bound to one subject, so a
//! QR check-in codec and an access-credential codec never accept each other's
//! tokens even when they share a secret. Expiry is not part of `verify`; it is
//! answered separately by `is_expired` against the injected clock.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::utils::clock::SharedClock;
use crate::utils::errors::{Result, TokenError, TokenResult};

/// Subject of session check-in tokens
pub const QR_SUBJECT: &str = "qr-check-in";
/// Subject of student access credentials
pub const ACCESS_SUBJECT: &str = "access";

pub const CLAIM_SESSION_ID: &str = "sessionId";
pub const CLAIM_STUDENT_ID: &str = "studentId";

const RESERVED_CLAIMS: [&str; 4] = ["iat", "exp", "sub", "jti"];

/// Codec construction parameters
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub secret: String,
    pub subject: String,
    pub validity: Duration,
}

/// Verified claim set
#[derive(Debug, Clone, PartialEq)]
pub struct Claims {
    inner: Map<String, Value>,
}

impl Claims {
    pub fn issued_at(&self) -> i64 {
        self.get_i64("iat").unwrap_or_default()
    }

    pub fn expires_at(&self) -> i64 {
        self.get_i64("exp").unwrap_or_default()
    }

    pub fn subject(&self) -> Option<&str> {
        self.get_str("sub")
    }

    pub fn token_id(&self) -> Option<&str> {
        self.get_str("jti")
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.inner.get(name).and_then(Value::as_i64)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.inner.get(name).and_then(Value::as_str)
    }
}

#[derive(Clone)]
pub struct TokenCodec {
    config: TokenConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    clock: SharedClock,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("subject", &self.config.subject)
            .field("validity", &self.config.validity)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(config: TokenConfig, clock: SharedClock) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
            clock,
        }
    }

    pub fn subject(&self) -> &str {
        &self.config.subject
    }

    /// Default validity window of tokens minted by this codec
    pub fn validity(&self) -> Duration {
        self.config.validity
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Sign `claims`, overwriting `iat`, `exp`, `sub` and `jti`
    pub fn issue(&self, mut claims: Map<String, Value>, valid_for: Duration) -> Result<String> {
        for reserved in RESERVED_CLAIMS {
            claims.remove(reserved);
        }

        let iat = self.clock.now().timestamp();
        let exp = iat + valid_for.num_seconds();
        claims.insert("iat".to_string(), Value::from(iat));
        claims.insert("exp".to_string(), Value::from(exp));
        claims.insert("sub".to_string(), Value::from(self.config.subject.clone()));
        claims.insert("jti".to_string(), Value::from(Uuid::new_v4().to_string()));

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Sign `claims` with the codec's default validity
    pub fn issue_default(&self, claims: Map<String, Value>) -> Result<String> {
        self.issue(claims, self.config.validity)
    }

    /// Check signature, structure and subject; expiry is left to `is_expired`
    pub fn verify(&self, token: &str) -> TokenResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.sub = Some(self.config.subject.clone());

        let data = decode::<Map<String, Value>>(token, &self.decoding_key, &validation)
            .map_err(|e| map_decode_error(e.into_kind()))?;

        let claims = Claims { inner: data.claims };
        for required in ["iat", "exp"] {
            if claims.get_i64(required).is_none() {
                return Err(TokenError::MissingClaim(required.to_string()));
            }
        }

        Ok(claims)
    }

    /// Whether `now` is past the token's `exp`; unverifiable tokens count as expired
    pub fn is_expired(&self, token: &str) -> bool {
        match self.verify(token) {
            Ok(claims) => self.claims_expired(&claims),
            Err(_) => true,
        }
    }

    /// Expiry check for claims that were already verified
    pub fn claims_expired(&self, claims: &Claims) -> bool {
        match DateTime::<Utc>::from_timestamp(claims.expires_at(), 0) {
            Some(expires_at) => self.clock.now() > expires_at,
            None => true,
        }
    }
}

fn map_decode_error(kind: ErrorKind) -> TokenError {
    match kind {
        ErrorKind::InvalidSignature => TokenError::BadSignature,
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => TokenError::UnsupportedAlgorithm,
        ErrorKind::InvalidSubject => TokenError::WrongSubject,
        ErrorKind::MissingRequiredClaim(claim) => TokenError::MissingClaim(claim),
        other => TokenError::Malformed(format!("{:?}", other)),
    }
}
