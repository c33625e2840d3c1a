//! CSRF state management for pending logins.

use chrono::{DateTime, Duration, TimeDelta, Utc};
use dashmap::DashMap;
use rand::Rng;

/// Data kept for a login between the authorization redirect and the callback.
#[derive(Debug, Clone)]
pub struct PendingLogin {
    /// Where to send the user once the login completes.
    pub return_to: Option<String>,
    /// When this state expires.
    pub expires_at: DateTime<Utc>,
}

/// Manager for OAuth state parameters with expiration.
///
/// Generates and validates CSRF state tokens. Each token can be validated once.
#[derive(Debug)]
pub struct StateManager {
    states: DashMap<String, PendingLogin>,
    ttl: Duration,
}

impl StateManager {
    /// Create a new state manager with default TTL of 10 minutes.
    pub fn new() -> Self {
        Self::with_ttl(Duration::minutes(10))
    }

    /// Create a new state manager with custom TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            states: DashMap::new(),
            ttl,
        }
    }

    /// Out-of-range values saturate to the longest representable TTL.
    pub fn with_ttl_seconds(seconds: i64) -> Self {
        let ttl = TimeDelta::try_seconds(seconds).unwrap_or(if seconds < 0 {
            TimeDelta::MIN
        } else {
            TimeDelta::MAX
        });
        Self::with_ttl(ttl)
    }

    /// Generate a new state token for a pending login.
    pub fn generate(&self, return_to: Option<String>) -> String {
        let state = Self::generate_token();
        let pending = PendingLogin {
            return_to,
            expires_at: expiry_after(Utc::now(), self.ttl),
        };
        self.states.insert(state.clone(), pending);
        state
    }

    /// Validate and consume a state token.
    ///
    /// Returns `None` if the state is unknown, already used, or expired.
    pub fn validate(&self, state: &str) -> Option<PendingLogin> {
        let (_, pending) = self.states.remove(state)?;
        if Utc::now() > pending.expires_at {
            return None;
        }
        Some(pending)
    }

    /// Clean up expired states. Returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let before = self.states.len();
        let now = Utc::now();
        self.states.retain(|_, pending| pending.expires_at > now);
        before.saturating_sub(self.states.len())
    }

    /// Number of outstanding logins.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Generate a cryptographically random state token.
    fn generate_token() -> String {
        let random_bytes: [u8; 32] = rand::thread_rng().gen();
        hex::encode(random_bytes)
    }
}

fn expiry_after(now: DateTime<Utc>, ttl: TimeDelta) -> DateTime<Utc> {
    now.checked_add_signed(ttl).unwrap_or(if ttl < TimeDelta::zero() {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}
