//! Controller for DingTalk brokered logins.
//!
//! Both endpoints are reached through browser redirects, so they take query
//! parameters only and never require a session of their own.

use crate::response::error_page;
use crate::{AppState, Error};

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Json, Redirect, Response};
use domain::federation::{CallbackParams, Outcome};
use domain::FederatedIdentity;
use log::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

/// Query parameters for starting a login
#[derive(Debug, Deserialize)]
pub struct LoginParams {
    pub return_to: Option<String>,
}

/// Body returned once DingTalk has vouched for the user.
#[derive(Debug, Serialize)]
pub struct BrokeredLogin {
    pub identity: FederatedIdentity,
    /// Attributes to write onto the local user.
    pub user_attributes: BTreeMap<String, String>,
    /// RFC 3339 expiry of the DingTalk access token. The token itself stays in the broker.
    pub access_token_expires_at: String,
    pub return_to: Option<String>,
}

/// GET /broker/dingtalk/login
///
/// Registers a pending login and redirects the browser to DingTalk's consent page.
#[utoipa::path(
    get,
    path = "/broker/dingtalk/login",
    params(
        ("return_to" = Option<String>, Query, description = "Where to send the user after the login completes"),
    ),
    responses(
        (status = 307, description = "Redirect to the DingTalk authorization page"),
        (status = 500, description = "Broker is misconfigured"),
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    Query(params): Query<LoginParams>,
) -> Result<impl IntoResponse, Error> {
    let state = app_state.pending_logins.register(params.return_to);
    let request = app_state
        .flow
        .provider()
        .authorization_url(&state, app_state.config.dingtalk_redirect_uri())?;

    debug!("Redirecting pending login to {}", request.url);
    Ok(Redirect::temporary(&request.url))
}

/// GET /broker/dingtalk/endpoint
///
/// The redirect URI registered with DingTalk. Finishes the login started by `login`.
/// A repeated query parameter keeps its first value.
#[utoipa::path(
    get,
    path = "/broker/dingtalk/endpoint",
    params(
        ("state" = Option<String>, Query, description = "State issued when the login started"),
        ("authCode" = Option<String>, Query, description = "Authorization code from DingTalk"),
        ("error" = Option<String>, Query, description = "Error code from DingTalk"),
    ),
    responses(
        (status = 200, description = "Federated identity, or a cancelled login"),
        (status = 502, description = "Login failed; HTML error page"),
    )
)]
pub async fn endpoint(
    State(app_state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Response {
    let outcome = match query {
        Ok(Query(pairs)) => {
            let params = CallbackParams::from_pairs(pairs);
            app_state
                .flow
                .handle_callback(&params, &app_state.pending_logins)
                .await
        }
        Err(rejection) => app_state.flow.reject_malformed(&rejection.body_text()).await,
    };

    match outcome {
        Outcome::Authenticated {
            identity,
            access_token,
            session,
        } => Json(BrokeredLogin {
            user_attributes: identity.user_attributes(),
            identity,
            access_token_expires_at: access_token.expires_at().to_rfc3339(),
            return_to: session.return_to,
        })
        .into_response(),
        Outcome::Cancelled { .. } => Json(json!({ "status": "cancelled" })).into_response(),
        Outcome::Failed(err) => error_page::render(&err),
    }
}
