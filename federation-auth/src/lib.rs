//! # federation-auth
//!
//! Everything needed to federate a DingTalk login into a local identity:
//! - OAuth 2.0 plumbing (authorization URL, pending-login state, token cache)
//! - The DingTalk provider (code exchange with a single retry, profile fetch)
//! - Name transliteration client used to derive portable usernames
//! - Identity normalization into a canonical `FederatedIdentity`
//! - HTTP client building with bounded timeouts
//!
//! ## Usage
//!
//! ```rust,ignore
//! use federation_auth::{
//!     http::HttpClientBuilder,
//!     oauth::{providers::dingtalk, token::CacheRegistry, IdentityProvider},
//!     transliteration,
//! };
//!
//! let http_client = HttpClientBuilder::new().build()?;
//! let transliterator = Arc::new(transliteration::Client::new(http_client.clone(), url));
//! let provider = dingtalk::Provider::new(config, http_client, Arc::new(CacheRegistry::new()), transliterator);
//! let token = provider.exchange_code(&auth_code).await?;
//! ```

pub mod error;
pub mod http;
pub mod identity;
pub mod oauth;
pub mod transliteration;

// Re-export commonly used types
pub use error::{Error, ErrorKind};
pub use identity::FederatedIdentity;
