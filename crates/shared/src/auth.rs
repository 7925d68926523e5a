//! HMAC edge-token generation and validation.
//!
//! A token is `base64(timestamp ++ "$" ++ base64(hmac_sha256(timestamp,
//! secret)))` where `timestamp` is RFC 3339. Validation recomputes the
//! signature and rejects tokens whose timestamp is older than the configured
//! window, so a leaked token goes stale on its own.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Reasons a token fails validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Token is not valid base64 or lacks the `$` separator.
    #[error("token is malformed")]
    Malformed,

    /// Embedded timestamp does not parse as RFC 3339.
    #[error("token timestamp is invalid")]
    InvalidTimestamp,

    /// Token is older than the configured window.
    #[error("token has expired")]
    Expired,

    /// Signature does not match.
    #[error("token signature mismatch")]
    BadSignature,
}

/// HMAC token service for the HTTP boundary.
#[derive(Debug, Clone)]
pub struct HmacAuth {
    secret: String,
    max_age: Duration,
}

impl HmacAuth {
    /// Creates a token service with the given secret and maximum token age.
    #[must_use]
    pub fn new(secret: impl Into<String>, max_age_minutes: i64) -> Self {
        Self {
            secret: secret.into(),
            max_age: Duration::minutes(max_age_minutes),
        }
    }

    /// Mints a token stamped with the current time.
    #[must_use]
    pub fn generate(&self) -> String {
        self.generate_at(Utc::now())
    }

    fn generate_at(&self, at: DateTime<Utc>) -> String {
        let timestamp = at.to_rfc3339();
        let signature = self.sign(&timestamp);
        BASE64.encode(format!("{timestamp}${signature}"))
    }

    /// Validates a token: shape, freshness, then signature.
    ///
    /// # Errors
    ///
    /// Returns a [`TokenError`] naming the first check that failed.
    pub fn validate(&self, token: &str) -> Result<(), TokenError> {
        let decoded = BASE64
            .decode(token.trim())
            .map_err(|_| TokenError::Malformed)?;
        let decoded = String::from_utf8(decoded).map_err(|_| TokenError::Malformed)?;
        let (timestamp, signature) = decoded.split_once('$').ok_or(TokenError::Malformed)?;

        let stamped = DateTime::parse_from_rfc3339(timestamp)
            .map_err(|_| TokenError::InvalidTimestamp)?
            .with_timezone(&Utc);
        if Utc::now() - self.max_age > stamped {
            return Err(TokenError::Expired);
        }

        if self.sign(timestamp) != signature {
            return Err(TokenError::BadSignature);
        }
        Ok(())
    }

    fn sign(&self, message: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(message.as_bytes());
        BASE64.encode(mac.finalize().into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> HmacAuth {
        HmacAuth::new("expelliarmus", 5)
    }

    #[test]
    fn test_round_trip() {
        let auth = auth();
        let token = auth.generate();
        assert_eq!(auth.validate(&token), Ok(()));
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(auth().validate("not-base64!!"), Err(TokenError::Malformed));
    }

    #[test]
    fn test_rejects_missing_separator() {
        let token = BASE64.encode("2026-01-01T00:00:00+00:00");
        assert_eq!(auth().validate(&token), Err(TokenError::Malformed));
    }

    #[test]
    fn test_rejects_expired() {
        let auth = auth();
        let token = auth.generate_at(Utc::now() - Duration::minutes(10));
        assert_eq!(auth.validate(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_rejects_wrong_secret() {
        let token = HmacAuth::new("other-secret", 5).generate();
        assert_eq!(auth().validate(&token), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_rejects_tampered_timestamp() {
        let auth = auth();
        let decoded = String::from_utf8(BASE64.decode(auth.generate()).unwrap()).unwrap();
        let (_, signature) = decoded.split_once('$').unwrap();
        let forged = BASE64.encode(format!(
            "{}${signature}",
            (Utc::now() + Duration::minutes(2)).to_rfc3339()
        ));
        assert_eq!(auth.validate(&forged), Err(TokenError::BadSignature));
    }
}
