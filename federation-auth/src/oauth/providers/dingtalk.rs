//! DingTalk identity provider implementation.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::error::{oauth_error, with_kind, Error, ErrorKind, OAuthErrorKind};
use crate::identity::{self, FederatedIdentity, DEFAULT_EMAIL_DOMAIN};
use crate::oauth::token::{AccessToken, CacheRegistry, ACCESS_TOKEN_CACHE_KEY};
use crate::oauth::{AuthorizationRequest, IdentityProvider, ProviderKind};
use crate::transliteration::Transliterator;

pub const AUTH_URL: &str = "https://login.dingtalk.com/oauth2/auth";
pub const TOKEN_URL: &str = "https://api.dingtalk.com/v1.0/oauth2/userAccessToken";
pub const PROFILE_URL: &str = "https://api.dingtalk.com/v1.0/contact/users/me";

pub const DEFAULT_SCOPE: &str = "openid corpid";

/// Header carrying the access token on DingTalk API calls (not a Bearer header).
pub const ACCESS_TOKEN_HEADER: &str = "x-acs-dingtalk-access-token";

const RESPONSE_TYPE: &str = "code";
const GRANT_TYPE: &str = "authorization_code";
/// Forces the consent screen; the v2 login page requires it.
const PROMPT: &str = "consent";

/// Read-only configuration of a DingTalk client.
#[derive(Debug, Clone)]
pub struct DingTalkConfig {
    /// Alias the provider is registered under.
    pub alias: String,
    pub client_id: String,
    pub client_secret: SecretString,
    pub auth_url: String,
    pub token_url: String,
    pub profile_url: String,
    pub scope: String,
    /// Domain for synthesized email addresses.
    pub email_domain: String,
}

impl DingTalkConfig {
    /// Configuration with the public DingTalk endpoints and default scope.
    pub fn new(client_id: String, client_secret: SecretString) -> Self {
        Self {
            alias: ProviderKind::DingTalk.as_str().to_string(),
            client_id,
            client_secret,
            auth_url: AUTH_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
            profile_url: PROFILE_URL.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            email_domain: DEFAULT_EMAIL_DOMAIN.to_string(),
        }
    }
}

/// Body of the user access token request.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    auth_code: &'a str,
    grant_type: &'a str,
}

/// User access token response. Only the fields the broker uses.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    access_token: Option<String>,
    expire_in: Option<i64>,
}

/// DingTalk OAuth provider.
///
/// Handles the DingTalk login flow:
/// - Authorization URL generation with a forced consent prompt
/// - Authorization code exchange, retried once on any failure
/// - Profile retrieval with the DingTalk access token header
/// - Profile normalization, transliterating the nick into a username
pub struct Provider {
    config: DingTalkConfig,
    http_client: reqwest::Client,
    token_caches: Arc<CacheRegistry>,
    transliterator: Arc<dyn Transliterator>,
}

impl Provider {
    /// Create a new DingTalk provider.
    ///
    /// # Arguments
    ///
    /// * `config` - Client credentials and endpoints
    /// * `http_client` - Shared HTTP client; its timeouts bound every call
    /// * `token_caches` - Application-owned token cache registry
    /// * `transliterator` - Used to derive usernames from display names
    pub fn new(
        config: DingTalkConfig,
        http_client: reqwest::Client,
        token_caches: Arc<CacheRegistry>,
        transliterator: Arc<dyn Transliterator>,
    ) -> Self {
        Self {
            config,
            http_client,
            token_caches,
            transliterator,
        }
    }

    pub fn config(&self) -> &DingTalkConfig {
        &self.config
    }

    /// The token most recently obtained for this client, unless it is expired or
    /// about to expire.
    pub fn cached_access_token(&self) -> Option<AccessToken> {
        self.token_caches
            .cache_for(&self.config.client_id)
            .get(ACCESS_TOKEN_CACHE_KEY)
            .filter(|token| !token.is_expired())
    }

    /// Drop the cached token and exchange `code` again.
    pub async fn reset_access_token(&self, code: &str) -> Result<AccessToken, Error> {
        self.token_caches
            .cache_for(&self.config.client_id)
            .invalidate(ACCESS_TOKEN_CACHE_KEY);
        self.exchange_code(code).await
    }

    /// One token request. Any unusable answer is an `InvalidResponse`.
    async fn request_access_token(&self, code: &str) -> Result<AccessToken, Error> {
        let request = TokenRequest {
            client_id: &self.config.client_id,
            client_secret: self.config.client_secret.expose_secret(),
            auth_code: code,
            grant_type: GRANT_TYPE,
        };

        let response = self
            .http_client
            .post(&self.config.token_url)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(oauth_error(
                OAuthErrorKind::InvalidResponse,
                &format!("token endpoint returned {}", status),
            ));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| with_kind(ErrorKind::OAuth(OAuthErrorKind::InvalidResponse), e))?;

        let access_token = body
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                oauth_error(
                    OAuthErrorKind::InvalidResponse,
                    "token response has no accessToken",
                )
            })?;

        let expires_in = body.expire_in.unwrap_or_default();
        debug!("Access token received, expires in {}s", expires_in);

        Ok(AccessToken::new(SecretString::new(access_token), expires_in))
    }
}

#[async_trait]
impl IdentityProvider for Provider {
    fn provider(&self) -> ProviderKind {
        ProviderKind::DingTalk
    }

    fn alias(&self) -> &str {
        &self.config.alias
    }

    fn authorization_url(
        &self,
        state: &str,
        redirect_uri: &str,
    ) -> Result<AuthorizationRequest, Error> {
        let url = Url::parse_with_params(
            &self.config.auth_url,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("response_type", RESPONSE_TYPE),
                ("scope", self.config.scope.as_str()),
                ("state", state),
                ("prompt", PROMPT),
            ],
        )?;

        debug!("Authorization URL is {}", url);
        Ok(AuthorizationRequest {
            url: url.to_string(),
            state: state.to_string(),
        })
    }

    async fn exchange_code(&self, code: &str) -> Result<AccessToken, Error> {
        debug!("Exchanging authorization code {} for an access token", code);

        let token = match self.request_access_token(code).await {
            Ok(token) => token,
            Err(first) => {
                warn!("Access token request failed, retrying once: {}", first);
                self.request_access_token(code).await.map_err(|second| {
                    error!("Access token request failed again: {}", second);
                    oauth_error(
                        OAuthErrorKind::TokenExchangeFailed,
                        "No access token available",
                    )
                })?
            }
        };

        if token.is_expired() {
            warn!(
                "Access token for client {} expires within minutes (expireIn={}s)",
                self.config.client_id, token.expires_in_seconds
            );
        }

        let cache = self.token_caches.cache_for(&self.config.client_id);
        cache.put(ACCESS_TOKEN_CACHE_KEY, token.clone());
        info!("Obtained access token, cached in {}", cache.name());

        Ok(token)
    }

    async fn fetch_profile(&self, access_token: &AccessToken) -> Result<Value, Error> {
        let fetch_failed = |e: Error| with_kind(ErrorKind::OAuth(OAuthErrorKind::ProfileFetchFailed), e);

        let response = self
            .http_client
            .get(&self.config.profile_url)
            .header(ACCESS_TOKEN_HEADER, access_token.secret())
            .send()
            .await
            .map_err(|e| fetch_failed(e.into()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(oauth_error(
                OAuthErrorKind::ProfileFetchFailed,
                &format!("profile endpoint returned {}", status),
            ));
        }

        let profile: Value = response.json().await.map_err(|e| fetch_failed(e.into()))?;
        debug!("Fetched profile {}", profile);
        Ok(profile)
    }

    async fn normalize(&self, profile: Value) -> Result<FederatedIdentity, Error> {
        identity::normalize(profile, self.transliterator.as_ref(), &self.config.email_domain).await
    }
}
