//! HTTP surface of the DingTalk broker: login redirect, callback endpoint and health.

use domain::error::Error as DomainError;
use domain::federation::FlowController;
use domain::gateway::dingtalk;
use domain::{CacheRegistry, StateManager};
use events::EventPublisher;
use log::*;
use service::config::Config;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

pub mod audit;
mod controller;
mod error;
pub mod pending_login;
mod response;
pub mod router;

pub use error::{Error, Result};
pub use pending_login::PendingLogins;

/// How often expired pending logins are swept out of memory.
const PENDING_LOGIN_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub flow: Arc<FlowController>,
    pub pending_logins: PendingLogins,
    /// Access token caches, one per DingTalk client id, shared by every provider instance.
    pub token_caches: Arc<CacheRegistry>,
}

impl AppState {
    /// Wires the DingTalk provider, audit logging and the pending-login store from config.
    pub fn new(config: Config) -> core::result::Result<Self, DomainError> {
        let token_caches = Arc::new(CacheRegistry::new());
        let provider = dingtalk::new_provider(&config, token_caches.clone())?;
        let events = EventPublisher::new().with_handler(Arc::new(audit::LoggingAuditHandler));
        let flow = Arc::new(FlowController::new(Arc::new(provider), events));
        let pending_logins = PendingLogins::new(Arc::new(StateManager::with_ttl_seconds(
            config.login_ttl_secs,
        )));

        Ok(Self {
            config,
            flow,
            pending_logins,
            token_caches,
        })
    }
}

pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let interface = app_state
        .config
        .interface
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let listen_addr = format!("{}:{}", interface, app_state.config.port);

    info!("Server starting... listening for connections on http://{listen_addr}");

    let listener = TcpListener::bind(&listen_addr).await?;
    spawn_pending_login_sweeper(app_state.pending_logins.clone());

    axum::serve(listener, router::define_routes(app_state)).await
}

fn spawn_pending_login_sweeper(pending_logins: PendingLogins) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PENDING_LOGIN_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = pending_logins.purge_expired();
            if removed > 0 {
                debug!("Purged {removed} expired pending logins");
            }
        }
    });
}
