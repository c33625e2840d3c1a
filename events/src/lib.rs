//! Audit event infrastructure for the identity broker.
//!
//! This crate lets the federation flow record security-relevant outcomes without
//! knowing where they end up (log lines, an audit table, a SIEM forwarder).
//!
//! # Architecture
//!
//! - **AuditEvent**: Enum representing the audited outcomes of a brokered login
//! - **EventHandler**: Trait for implementing event handlers
//! - **EventPublisher**: Publishes events to registered handlers
//!
//! This crate has no dependencies on internal crates (domain, federation-auth, etc.),
//! avoiding circular dependencies.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Identifier attached to every audit event.
pub type Id = Uuid;

/// Event type shared by every brokered login event.
pub const IDENTITY_PROVIDER_LOGIN: &str = "identity_provider_login";

/// Error category recorded when a brokered login fails.
pub const IDENTITY_PROVIDER_LOGIN_FAILURE: &str = "identity_provider_login_failure";

/// Audited outcomes of a brokered login.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    /// A federated identity was handed to the hosting framework.
    IdentityProviderLogin {
        event_id: Id,
        provider_alias: String,
        federated_id: String,
    },
    /// A callback ended in a failure page.
    IdentityProviderLoginFailed {
        event_id: Id,
        provider_alias: String,
        /// Always [`IDENTITY_PROVIDER_LOGIN_FAILURE`].
        error: String,
        /// Machine-readable failure kind, e.g. `missing_state`.
        reason: String,
    },
}

impl AuditEvent {
    pub fn login(provider_alias: &str, federated_id: &str) -> Self {
        AuditEvent::IdentityProviderLogin {
            event_id: Uuid::new_v4(),
            provider_alias: provider_alias.to_string(),
            federated_id: federated_id.to_string(),
        }
    }

    pub fn login_failed(provider_alias: &str, reason: &str) -> Self {
        AuditEvent::IdentityProviderLoginFailed {
            event_id: Uuid::new_v4(),
            provider_alias: provider_alias.to_string(),
            error: IDENTITY_PROVIDER_LOGIN_FAILURE.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn event_type(&self) -> &'static str {
        IDENTITY_PROVIDER_LOGIN
    }

    pub fn event_id(&self) -> Id {
        match self {
            AuditEvent::IdentityProviderLogin { event_id, .. }
            | AuditEvent::IdentityProviderLoginFailed { event_id, .. } => *event_id,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, AuditEvent::IdentityProviderLoginFailed { .. })
    }
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &AuditEvent);
}

#[derive(Clone)]
pub struct EventPublisher {
    handlers: Arc<Vec<Arc<dyn EventHandler>>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Vec::new()),
        }
    }

    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        let mut handlers = (*self.handlers).clone();
        handlers.push(handler);
        self.handlers = Arc::new(handlers);
        self
    }

    pub async fn publish(&self, event: AuditEvent) {
        for handler in self.handlers.iter() {
            handler.handle(&event).await;
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
