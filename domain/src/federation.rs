//! Drives a DingTalk callback from query parameters to a federated identity.
//!
//! The browser comes back from DingTalk with `state` and either `authCode` or
//! `error`. [`FlowController::handle_callback`] walks the login through
//!
//! ```text
//! AwaitingRedirect -> StateValidated -> ErrorReceived | CodeReceived
//!                  -> Exchanged -> ProfileFetched -> Normalized -> Delivered
//! ```
//!
//! and ends in exactly one [`Outcome`]. Every failed login is audited once.

use crate::error::{DomainErrorKind, Error, FederationErrorKind};
use events::{AuditEvent, EventPublisher};
use federation_auth::oauth::token::AccessToken;
use federation_auth::oauth::IdentityProvider;
use federation_auth::FederatedIdentity;
use log::*;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

/// DingTalk's upstream error codes the flow reacts to.
pub const ACCESS_DENIED: &str = "access_denied";
pub const LOGIN_REQUIRED: &str = "login_required";
pub const INTERACTION_REQUIRED: &str = "interaction_required";

/// Query parameters DingTalk appends to the redirect URI.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub state: Option<String>,
    #[serde(rename = "authCode")]
    pub auth_code: Option<String>,
    pub error: Option<String>,
}

impl CallbackParams {
    /// Builds the parameters from raw query pairs. A repeated parameter keeps its
    /// first value; unknown parameters are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "state" => &mut params.state,
                "authCode" => &mut params.auth_code,
                "error" => &mut params.error,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into());
            }
        }
        params
    }
}

/// The hosting side's view of a login in progress.
///
/// Implementations look up the pending authentication that issued `state` and hand
/// back whatever session object the host needs to finish the login.
pub trait AuthenticationCallback {
    type Session;

    fn verify_session(&self, state: &str) -> Result<Self::Session, Error>;
}

/// Terminal result of a callback.
#[derive(Debug)]
pub enum Outcome<S> {
    Authenticated {
        identity: FederatedIdentity,
        /// DingTalk's user access token, handed to the host as the federated token.
        access_token: AccessToken,
        session: S,
    },
    Cancelled {
        session: S,
    },
    Failed(Error),
}

#[derive(Debug, Clone, Copy)]
enum FlowState {
    AwaitingRedirect,
    StateValidated,
    ErrorReceived,
    CodeReceived,
    Exchanged,
    ProfileFetched,
    Normalized,
    Delivered,
    Cancelled,
    Failed,
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

pub struct FlowController {
    provider: Arc<dyn IdentityProvider>,
    events: EventPublisher,
}

impl FlowController {
    pub fn new(provider: Arc<dyn IdentityProvider>, events: EventPublisher) -> Self {
        Self { provider, events }
    }

    pub fn provider(&self) -> &Arc<dyn IdentityProvider> {
        &self.provider
    }

    fn transition(&self, from: FlowState, to: FlowState) {
        debug!(
            "Broker login for {}: {} -> {}",
            self.provider.alias(),
            from,
            to
        );
    }

    /// Runs one callback to completion.
    ///
    /// `error` wins over `authCode` when DingTalk sends both. Stage failures are
    /// reported as `UnexpectedError` with the stage error kept as its source.
    pub async fn handle_callback<C>(
        &self,
        params: &CallbackParams,
        callback: &C,
    ) -> Outcome<C::Session>
    where
        C: AuthenticationCallback + ?Sized,
    {
        let state = match params.state.as_deref() {
            Some(state) => state,
            None => {
                warn!("Broker login for {} is missing state", self.provider.alias());
                return self
                    .fail(
                        FlowState::AwaitingRedirect,
                        Error::federation(FederationErrorKind::MissingState),
                    )
                    .await;
            }
        };

        let session = match callback.verify_session(state) {
            Ok(session) => session,
            Err(err) => {
                warn!(
                    "Broker login for {} has no pending session: {}",
                    self.provider.alias(),
                    err
                );
                return self
                    .fail(FlowState::AwaitingRedirect, invalid_state(err))
                    .await;
            }
        };
        self.transition(FlowState::AwaitingRedirect, FlowState::StateValidated);

        if let Some(code) = params.error.as_deref() {
            self.transition(FlowState::StateValidated, FlowState::ErrorReceived);
            error!(
                "{} for broker login {}",
                code,
                self.provider.provider().as_str()
            );
            return match code {
                ACCESS_DENIED => {
                    self.transition(FlowState::ErrorReceived, FlowState::Cancelled);
                    Outcome::Cancelled { session }
                }
                LOGIN_REQUIRED | INTERACTION_REQUIRED => {
                    self.fail(
                        FlowState::ErrorReceived,
                        Error::federation(FederationErrorKind::UpstreamInteractionRequired(
                            code.to_string(),
                        )),
                    )
                    .await
                }
                _ => {
                    self.fail(
                        FlowState::ErrorReceived,
                        Error::federation(FederationErrorKind::UnexpectedError),
                    )
                    .await
                }
            };
        }

        let Some(code) = params.auth_code.as_deref() else {
            warn!(
                "Broker login for {} returned neither authCode nor error",
                self.provider.alias()
            );
            return self
                .fail(
                    FlowState::StateValidated,
                    Error::federation(FederationErrorKind::UnexpectedError),
                )
                .await;
        };
        self.transition(FlowState::StateValidated, FlowState::CodeReceived);
        debug!("Received authCode={code}");

        match self.federate(code).await {
            Ok((identity, access_token)) => {
                self.transition(FlowState::Normalized, FlowState::Delivered);
                info!(
                    "Broker login for {} delivered {}",
                    self.provider.alias(),
                    identity.federated_id
                );
                self.events
                    .publish(AuditEvent::login(
                        self.provider.alias(),
                        &identity.federated_id,
                    ))
                    .await;
                Outcome::Authenticated {
                    identity,
                    access_token,
                    session,
                }
            }
            Err((from, err)) => {
                error!(
                    "Failed to make identity provider oauth callback: {} ({})",
                    err.detailed_reason(),
                    err
                );
                self.fail(from, Error::unexpected(err)).await
            }
        }
    }

    /// Exchange, fetch and normalize, in order. Returns the state the flow was in
    /// when a stage failed.
    async fn federate(
        &self,
        code: &str,
    ) -> Result<(FederatedIdentity, AccessToken), (FlowState, Error)> {
        let access_token = self
            .provider
            .exchange_code(code)
            .await
            .map_err(|err| (FlowState::CodeReceived, Error::from(err)))?;
        self.transition(FlowState::CodeReceived, FlowState::Exchanged);

        let profile = self
            .provider
            .fetch_profile(&access_token)
            .await
            .map_err(|err| (FlowState::Exchanged, Error::from(err)))?;
        self.transition(FlowState::Exchanged, FlowState::ProfileFetched);

        let identity = self
            .provider
            .normalize(profile)
            .await
            .map_err(|err| (FlowState::ProfileFetched, Error::from(err)))?;
        self.transition(FlowState::ProfileFetched, FlowState::Normalized);

        Ok((identity, access_token))
    }

    /// Fails a callback whose query string could not be read at all. Audited like
    /// any other failed login.
    pub async fn reject_malformed<S>(&self, detail: &str) -> Outcome<S> {
        warn!(
            "Broker login for {} has a malformed callback: {}",
            self.provider.alias(),
            detail
        );
        let err = Error {
            source: Some(detail.to_string().into()),
            error_kind: DomainErrorKind::Federation(FederationErrorKind::UnexpectedError),
        };
        self.fail(FlowState::AwaitingRedirect, err).await
    }

    async fn fail<S>(&self, from: FlowState, err: Error) -> Outcome<S> {
        self.transition(from, FlowState::Failed);
        self.events
            .publish(AuditEvent::login_failed(
                self.provider.alias(),
                err.detailed_reason(),
            ))
            .await;
        Outcome::Failed(err)
    }
}

fn invalid_state(err: Error) -> Error {
    if err.error_kind == DomainErrorKind::Federation(FederationErrorKind::InvalidState) {
        return err;
    }
    Error {
        source: Some(Box::new(err)),
        error_kind: DomainErrorKind::Federation(FederationErrorKind::InvalidState),
    }
}
