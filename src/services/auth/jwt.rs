use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::TimeDelta;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::services::auth::principal::Role;
use crate::services::clock::Clock;

/// HS256 needs at least 256 bits of key material.
pub const MIN_SECRET_BYTES: usize = 32;

/// Longest accepted session lifetime (one year).
pub const MAX_TTL_MINUTES: u64 = 365 * 24 * 60;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("signing secret is not valid base64: {0}")]
    SecretEncoding(#[from] base64::DecodeError),
    #[error("signing secret must be at least {MIN_SECRET_BYTES} bytes, got {0}")]
    SecretTooShort(usize),
    #[error("token lifetime must be between 1 and {MAX_TTL_MINUTES} minutes, got {0}")]
    InvalidTtl(u64),
    #[error("token expiry is out of the representable time range")]
    ExpiryOverflow,
    #[error("jwt error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// Session token claims.
///
/// `iat`/`exp` are seconds since the epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and checks HS256 session tokens.
///
/// The secret is decoded once here and never changes afterwards. Replacing it
/// (restart with a new `JWT_SECRET`) invalidates every token already handed out;
/// there is no key rotation.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("TokenCodec")
            .field("ttl_minutes", &self.ttl.num_minutes())
            .finish()
    }
}

impl TokenCodec {
    /// `secret_b64` is the standard-alphabet Base64 form of the raw key bytes.
    pub fn new(
        secret_b64: &str,
        ttl_minutes: u64,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, TokenError> {
        let ttl = ttl_from_minutes(ttl_minutes)?;

        let secret = STANDARD.decode(secret_b64.trim())?;
        if secret.len() < MIN_SECRET_BYTES {
            return Err(TokenError::SecretTooShort(secret.len()));
        }

        // Expiry is checked against our own clock in `verify`, not jsonwebtoken's.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "iat", "exp"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(&secret),
            decoding_key: DecodingKey::from_secret(&secret),
            validation,
            ttl,
            clock,
        })
    }

    pub fn issue(&self, username: &str, role: Role) -> Result<String, TokenError> {
        let issued_at = self.clock.now();
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or(TokenError::ExpiryOverflow)?;

        let claims = SessionClaims {
            sub: username.to_string(),
            role,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".to_string());

        Ok(jsonwebtoken::encode(&header, &claims, &self.encoding_key)?)
    }

    /// Signature-checked claims. Does not look at `exp`.
    pub fn decode(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let data =
            jsonwebtoken::decode::<SessionClaims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }

    /// True only for a correctly signed token whose `exp` is strictly in the future.
    pub fn verify(&self, token: &str) -> bool {
        match self.decode(token) {
            Ok(claims) => self.clock.now().timestamp() < claims.exp,
            Err(_) => false,
        }
    }

    /// Subject of a correctly signed token.
    ///
    /// Tolerates an expired token: callers pair this with [`TokenCodec::verify`],
    /// which owns the expiry decision. A forged or malformed token is an error.
    pub fn extract_subject(&self, token: &str) -> Result<String, TokenError> {
        Ok(self.decode(token)?.sub)
    }
}

fn ttl_from_minutes(minutes: u64) -> Result<TimeDelta, TokenError> {
    if !(1..=MAX_TTL_MINUTES).contains(&minutes) {
        return Err(TokenError::InvalidTtl(minutes));
    }
    i64::try_from(minutes)
        .ok()
        .and_then(TimeDelta::try_minutes)
        .ok_or(TokenError::InvalidTtl(minutes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::clock::ManualClock;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    const SECRET_A: &str = "c2t5ZGl2aW5nLWxvZ2Jvb2stdGVzdC1zZWNyZXQta2V5LWE=";
    const SECRET_B: &str = "c2t5ZGl2aW5nLWxvZ2Jvb2stdGVzdC1zZWNyZXQta2V5LWI=";

    fn codec_at(secret: &str, clock: Arc<ManualClock>) -> TokenCodec {
        TokenCodec::new(secret, 60, clock).unwrap()
    }

    fn new_year() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        ))
    }

    #[test]
    fn subject_survives_issue_and_extract() {
        let codec = codec_at(SECRET_A, new_year());
        let token = codec.issue("jane@example.com", Role::Skydiver).unwrap();

        assert!(codec.verify(&token));
        assert_eq!(codec.extract_subject(&token).unwrap(), "jane@example.com");

        let claims = codec.decode(&token).unwrap();
        assert_eq!(claims.role, Role::Skydiver);
        assert_eq!(claims.exp - claims.iat, 60 * 60);
    }

    #[test]
    fn token_is_compact_three_part_string() {
        let codec = codec_at(SECRET_A, new_year());
        let token = codec.issue("jane@example.com", Role::Admin).unwrap();
        assert_eq!(token.split('.').count(), 3);
        assert!(!token.contains('='));
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let clock = new_year();
        let codec = codec_at(SECRET_A, clock.clone());
        let token = codec.issue("jane@example.com", Role::Skydiver).unwrap();

        clock.set(Utc.with_ymd_and_hms(2025, 1, 1, 0, 59, 59).unwrap());
        assert!(codec.verify(&token));

        clock.set(Utc.with_ymd_and_hms(2025, 1, 1, 1, 0, 0).unwrap());
        assert!(!codec.verify(&token));

        clock.set(Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap());
        assert!(!codec.verify(&token));
    }

    #[test]
    fn expired_token_still_yields_subject() {
        let clock = new_year();
        let codec = codec_at(SECRET_A, clock.clone());
        let token = codec.issue("jane@example.com", Role::Skydiver).unwrap();

        clock.advance(Duration::hours(3));
        assert!(!codec.verify(&token));
        assert_eq!(codec.extract_subject(&token).unwrap(), "jane@example.com");
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let clock = new_year();
        let issuer = codec_at(SECRET_A, clock.clone());
        let verifier = codec_at(SECRET_B, clock);

        let token = issuer.issue("jane@example.com", Role::Admin).unwrap();
        assert!(!verifier.verify(&token));
        assert!(verifier.extract_subject(&token).is_err());
    }

    #[test]
    fn tampered_claims_are_rejected() {
        let codec = codec_at(SECRET_A, new_year());
        let token = codec.issue("jane@example.com", Role::Skydiver).unwrap();

        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(
            br#"{"sub":"jane@example.com","role":"ADMIN","iat":1735689600,"exp":1735693200}"#,
        );
        parts[1] = &forged;
        let tampered = parts.join(".");

        assert!(!codec.verify(&tampered));
        assert!(codec.extract_subject(&tampered).is_err());
    }

    #[test]
    fn garbage_never_verifies() {
        let codec = codec_at(SECRET_A, new_year());
        for junk in ["", "abc", "a.b.c", "Bearer x.y.z"] {
            assert!(!codec.verify(junk), "{junk:?} verified");
            assert!(codec.extract_subject(junk).is_err());
        }
    }

    #[test]
    fn short_or_non_base64_secret_is_refused() {
        let clock: Arc<dyn Clock> = new_year();
        assert!(matches!(
            TokenCodec::new("c2hvcnQ=", 60, clock.clone()),
            Err(TokenError::SecretTooShort(5))
        ));
        assert!(matches!(
            TokenCodec::new("not base64 at all!", 60, clock),
            Err(TokenError::SecretEncoding(_))
        ));
    }

    #[test]
    fn ttl_outside_range_is_refused() {
        for minutes in [0, MAX_TTL_MINUTES + 1, 1_000_000_000_000, u64::MAX] {
            let clock: Arc<dyn Clock> = new_year();
            assert!(
                matches!(
                    TokenCodec::new(SECRET_A, minutes, clock),
                    Err(TokenError::InvalidTtl(m)) if m == minutes
                ),
                "{minutes} accepted"
            );
        }

        let codec = TokenCodec::new(SECRET_A, MAX_TTL_MINUTES, new_year()).unwrap();
        let claims = codec
            .decode(&codec.issue("jane@example.com", Role::Skydiver).unwrap())
            .unwrap();
        assert_eq!(claims.exp - claims.iat, MAX_TTL_MINUTES as i64 * 60);
    }

    #[test]
    fn expiry_past_the_calendar_end_is_an_error() {
        let clock = Arc::new(ManualClock::new(DateTime::<Utc>::MAX_UTC - Duration::minutes(1)));
        let codec = codec_at(SECRET_A, clock);
        assert!(matches!(
            codec.issue("jane@example.com", Role::Skydiver),
            Err(TokenError::ExpiryOverflow)
        ));
    }
}
