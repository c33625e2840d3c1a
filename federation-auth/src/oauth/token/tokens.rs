//! OAuth token types.

use chrono::{DateTime, Duration, TimeDelta, Utc};
use secrecy::{ExposeSecret, SecretString};

/// Access token issued by the upstream token endpoint.
#[derive(Debug, Clone)]
pub struct AccessToken {
    value: SecretString,
    /// Lifetime reported by the token endpoint, in seconds.
    pub expires_in_seconds: i64,
    /// When the token was received.
    pub obtained_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(value: SecretString, expires_in_seconds: i64) -> Self {
        Self {
            value,
            expires_in_seconds,
            obtained_at: Utc::now(),
        }
    }

    /// The raw token, for placing on an outbound request.
    pub fn secret(&self) -> &str {
        self.value.expose_secret()
    }

    /// When the token stops being valid according to the upstream lifetime.
    ///
    /// Lifetimes too large to represent saturate to the latest representable instant.
    pub fn expires_at(&self) -> DateTime<Utc> {
        TimeDelta::try_seconds(self.expires_in_seconds)
            .and_then(|lifetime| self.obtained_at.checked_add_signed(lifetime))
            .unwrap_or(if self.expires_in_seconds < 0 {
                DateTime::<Utc>::MIN_UTC
            } else {
                DateTime::<Utc>::MAX_UTC
            })
    }

    /// Check if the access token is expired or about to expire soon.
    ///
    /// Returns true if token is expired or will expire within 5 minutes. Nothing in the
    /// cache enforces this; callers decide what to do with a stale token.
    pub fn is_expired(&self) -> bool {
        self.expires_at() <= Utc::now() + Duration::minutes(5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(expires_in_seconds: i64) -> AccessToken {
        AccessToken::new(SecretString::new("test".to_string()), expires_in_seconds)
    }

    #[test]
    fn test_token_not_expired() {
        assert!(!token(3600).is_expired());
    }

    #[test]
    fn test_token_expiring_soon() {
        assert!(token(120).is_expired());
    }

    #[test]
    fn test_token_without_lifetime_is_expired() {
        assert!(token(0).is_expired());
    }

    #[test]
    fn test_huge_lifetime_saturates_instead_of_panicking() {
        let token = token(i64::MAX);

        assert_eq!(token.expires_at(), DateTime::<Utc>::MAX_UTC);
        assert!(!token.is_expired());
    }

    #[test]
    fn test_hugely_negative_lifetime_is_expired() {
        let token = token(i64::MIN);

        assert_eq!(token.expires_at(), DateTime::<Utc>::MIN_UTC);
        assert!(token.is_expired());
    }

    #[test]
    fn test_expires_at_adds_lifetime() {
        let token = token(3600);
        assert_eq!(token.expires_at(), token.obtained_at + Duration::hours(1));
    }

    #[test]
    fn test_debug_does_not_leak_secret() {
        let rendered = format!("{:?}", token(3600));
        assert!(!rendered.contains("\"test\""));
    }
}
