//! Brokered login orchestration on top of `federation-auth`.
//!
//! `web` depends on this crate rather than on `federation-auth` directly, so the
//! types it needs from the lower layer are re-exported here.
pub use federation_auth::oauth::{
    providers::dingtalk::Provider as DingTalkProvider, token::CacheRegistry, IdentityProvider,
    PendingLogin, StateManager,
};
pub use federation_auth::FederatedIdentity;

pub mod error;
pub mod federation;

pub mod gateway;
