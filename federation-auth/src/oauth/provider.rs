//! Identity provider trait and types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::token::AccessToken;
use crate::error::Error;
use crate::identity::FederatedIdentity;

/// Known upstream identity providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    DingTalk,
}

impl ProviderKind {
    /// Get the provider identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::DingTalk => "dingtalk",
        }
    }
}

/// Authorization request with URL and state management data.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    /// Authorization URL to redirect the user to.
    pub url: String,
    /// CSRF state parameter for validation.
    pub state: String,
}

/// Trait for upstream identity providers.
///
/// Bundles the capabilities a federation flow needs from a provider, each step
/// consuming the output of the previous one:
/// - Authorization URL generation
/// - Authorization code exchange for an access token
/// - Remote profile retrieval
/// - Profile normalization into a [`FederatedIdentity`]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Get the provider kind.
    fn provider(&self) -> ProviderKind;

    /// Alias under which this provider is configured, used in logs and audit events.
    fn alias(&self) -> &str;

    /// Generate the authorization URL the browser is redirected to.
    ///
    /// # Arguments
    ///
    /// * `state` - CSRF state parameter for validation
    /// * `redirect_uri` - Where the provider sends the browser back to
    fn authorization_url(&self, state: &str, redirect_uri: &str)
        -> Result<AuthorizationRequest, Error>;

    /// Exchange an authorization code for an access token.
    async fn exchange_code(&self, code: &str) -> Result<AccessToken, Error>;

    /// Fetch the raw user profile with an access token.
    async fn fetch_profile(&self, access_token: &AccessToken) -> Result<Value, Error>;

    /// Map a raw profile document onto a canonical identity.
    async fn normalize(&self, profile: Value) -> Result<FederatedIdentity, Error>;
}
