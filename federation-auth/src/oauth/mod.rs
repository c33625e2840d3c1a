//! OAuth 2.0 federation infrastructure.
//!
//! Provides the authorization-code flow pieces used to broker a DingTalk login.

mod provider;
mod state;

pub mod providers;
pub mod token;

pub use provider::{AuthorizationRequest, IdentityProvider, ProviderKind};
pub use state::{PendingLogin, StateManager};
