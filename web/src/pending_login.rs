use domain::error::{Error, FederationErrorKind};
use domain::federation::AuthenticationCallback;
use domain::{PendingLogin, StateManager};
use std::sync::Arc;

/// Logins that were sent to DingTalk and have not come back yet.
///
/// Each `state` handed out by [`PendingLogins::register`] is accepted by exactly one
/// callback before it expires.
#[derive(Clone, Debug)]
pub struct PendingLogins {
    states: Arc<StateManager>,
}

impl PendingLogins {
    pub fn new(states: Arc<StateManager>) -> Self {
        Self { states }
    }

    /// Records a login about to be redirected upstream and returns its `state`.
    pub fn register(&self, return_to: Option<String>) -> String {
        self.states.generate(return_to)
    }

    pub fn purge_expired(&self) -> usize {
        self.states.cleanup_expired()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl AuthenticationCallback for PendingLogins {
    type Session = PendingLogin;

    fn verify_session(&self, state: &str) -> Result<Self::Session, Error> {
        self.states
            .validate(state)
            .ok_or_else(|| Error::federation(FederationErrorKind::InvalidState))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::error::DomainErrorKind;

    #[test]
    fn test_registered_state_verifies_once() {
        let pending = PendingLogins::new(Arc::new(StateManager::new()));
        let state = pending.register(Some("/app".to_string()));

        let session = pending.verify_session(&state).unwrap();
        assert_eq!(session.return_to.as_deref(), Some("/app"));

        let err = pending.verify_session(&state).unwrap_err();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Federation(FederationErrorKind::InvalidState)
        );
        assert!(pending.is_empty());
    }

    #[test]
    fn test_expired_state_is_rejected_and_purged() {
        let pending = PendingLogins::new(Arc::new(StateManager::with_ttl_seconds(-1)));
        let first = pending.register(None);
        pending.register(None);

        assert!(pending.verify_session(&first).is_err());
        assert_eq!(pending.purge_expired(), 1);
        assert_eq!(pending.len(), 0);
    }
}
