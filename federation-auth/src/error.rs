//! Error types for the `federation-auth` crate.
//!
//! Follows the same pattern as domain::error with a root Error struct and error kind enums.

use std::error::Error as StdError;
use std::fmt;

/// Top-level error type for federation-auth crate.
/// Holds error kind and optional source for error chaining.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

/// Major categories of errors in federation-auth.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    OAuth(OAuthErrorKind),
    Identity(IdentityErrorKind),
    Http(HttpErrorKind),
    Config(ConfigErrorKind),
}

/// Errors from the OAuth round trips against the upstream provider.
#[derive(Debug, PartialEq)]
pub enum OAuthErrorKind {
    /// No access token could be obtained, even after the single retry.
    TokenExchangeFailed,
    ProfileFetchFailed,
    /// A single upstream response was unusable (bad status, body or fields).
    InvalidResponse,
}

/// Errors raised while turning a remote profile into a local identity.
#[derive(Debug, PartialEq)]
pub enum IdentityErrorKind {
    MalformedProfile,
    TransliterationFailed,
}

/// Errors from HTTP client operations.
#[derive(Debug, PartialEq)]
pub enum HttpErrorKind {
    BuilderFailed,
    RequestFailed,
    Network,
    Timeout,
}

/// Errors from provider configuration.
#[derive(Debug, PartialEq)]
pub enum ConfigErrorKind {
    InvalidUrl,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            ErrorKind::OAuth(kind) => write!(f, "OAuth error: {:?}", kind)?,
            ErrorKind::Identity(kind) => write!(f, "Identity error: {:?}", kind)?,
            ErrorKind::Http(kind) => write!(f, "HTTP error: {:?}", kind)?,
            ErrorKind::Config(kind) => write!(f, "Config error: {:?}", kind)?,
        }
        if let Some(source) = &self.source {
            write!(f, " ({})", source)?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let error_kind = if err.is_builder() {
            ErrorKind::Http(HttpErrorKind::BuilderFailed)
        } else if err.is_timeout() {
            ErrorKind::Http(HttpErrorKind::Timeout)
        } else if err.is_request() {
            ErrorKind::Http(HttpErrorKind::RequestFailed)
        } else {
            ErrorKind::Http(HttpErrorKind::Network)
        };

        Error {
            source: Some(Box::new(err.without_url())),
            error_kind,
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: ErrorKind::Config(ConfigErrorKind::InvalidUrl),
        }
    }
}

/// Helper function to create OAuth errors.
pub fn oauth_error(kind: OAuthErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::OAuth(kind),
    }
}

/// Helper function to create identity errors.
pub fn identity_error(kind: IdentityErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Identity(kind),
    }
}

/// Re-classifies a lower-level error while keeping it as the source.
pub(crate) fn with_kind(error_kind: ErrorKind, source: impl Into<Error>) -> Error {
    Error {
        source: Some(Box::new(source.into())),
        error_kind,
    }
}
