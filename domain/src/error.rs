//! Error types for the `domain` layer.
use federation_auth::error::{
    ErrorKind as AuthErrorKind, HttpErrorKind, IdentityErrorKind, OAuthErrorKind,
};
use federation_auth::Error as AuthError;
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree structure
/// with `domain::error::Error` as the root type holding a tree of `error_kind`
/// enums that represent the kinds of errors that can occur in the domain layer or
/// in lower layers. The `source` field is used to hold the original error that caused
/// the domain error. Ex. `domain` is dependent on `federation-auth`, and `web` is dependent
/// on `domain`, but `web` should not be dependent, directly, on `federation-auth`.
/// Ultimately the various `error_kind`s are used by `web` to pick the page and message
/// shown to the user.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    Federation(FederationErrorKind),
    Internal(InternalErrorKind),
    External(ExternalErrorKind),
}

/// Why a brokered login did not produce an identity.
#[derive(Debug, Clone, PartialEq)]
pub enum FederationErrorKind {
    /// The callback carried no `state` parameter.
    MissingState,
    /// The `state` did not match a pending login.
    InvalidState,
    /// DingTalk asked for `login_required` or `interaction_required`; holds the code verbatim.
    UpstreamInteractionRequired(String),
    TokenExchangeFailed,
    ProfileFetchFailed,
    TransliterationFailed,
    MalformedProfile,
    UnexpectedError,
}

/// Enum representing the various kinds of internal errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    Config,
    Other(String),
}

/// Enum representing the various kinds of external errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum ExternalErrorKind {
    Network,
}

const MISSING_STATE_MESSAGE: &str = "Missing state parameter in response from identity provider.";
const INVALID_STATE_MESSAGE: &str =
    "Your login attempt has expired or was already used. Please start again.";
const UNEXPECTED_ERROR_MESSAGE: &str = "Unexpected error when authenticating with identity provider";

impl Error {
    pub fn federation(kind: FederationErrorKind) -> Self {
        Error {
            source: None,
            error_kind: DomainErrorKind::Federation(kind),
        }
    }

    pub fn config(message: &str) -> Self {
        Error {
            source: Some(message.to_string().into()),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
        }
    }

    /// Hides a stage failure behind `UnexpectedError`, keeping it as the source.
    pub fn unexpected(cause: Error) -> Self {
        Error {
            source: Some(Box::new(cause)),
            error_kind: DomainErrorKind::Federation(FederationErrorKind::UnexpectedError),
        }
    }

    /// Kind of the domain error this one wraps, if any.
    pub fn cause_kind(&self) -> Option<&DomainErrorKind> {
        self.source
            .as_ref()
            .and_then(|source| source.downcast_ref::<Error>())
            .map(|cause| &cause.error_kind)
    }

    /// Machine-readable code recorded on audit events.
    pub fn reason(&self) -> &'static str {
        reason_code(&self.error_kind)
    }

    /// The most specific reason available: the wrapped cause's, else this error's.
    pub fn detailed_reason(&self) -> &'static str {
        self.cause_kind()
            .map(reason_code)
            .unwrap_or_else(|| self.reason())
    }

    /// Text safe to render to the end user. Never includes upstream details other
    /// than an interaction code DingTalk itself sent back.
    pub fn user_message(&self) -> String {
        match &self.error_kind {
            DomainErrorKind::Federation(FederationErrorKind::MissingState) => {
                MISSING_STATE_MESSAGE.to_string()
            }
            DomainErrorKind::Federation(FederationErrorKind::InvalidState) => {
                INVALID_STATE_MESSAGE.to_string()
            }
            DomainErrorKind::Federation(FederationErrorKind::UpstreamInteractionRequired(code)) => {
                code.clone()
            }
            _ => UNEXPECTED_ERROR_MESSAGE.to_string(),
        }
    }
}

fn reason_code(kind: &DomainErrorKind) -> &'static str {
    match kind {
        DomainErrorKind::Federation(kind) => match kind {
            FederationErrorKind::MissingState => "missing_state",
            FederationErrorKind::InvalidState => "invalid_state",
            FederationErrorKind::UpstreamInteractionRequired(_) => "upstream_interaction_required",
            FederationErrorKind::TokenExchangeFailed => "token_exchange_failed",
            FederationErrorKind::ProfileFetchFailed => "profile_fetch_failed",
            FederationErrorKind::TransliterationFailed => "transliteration_failed",
            FederationErrorKind::MalformedProfile => "malformed_profile",
            FederationErrorKind::UnexpectedError => "unexpected_error",
        },
        DomainErrorKind::Internal(InternalErrorKind::Config) => "config_error",
        DomainErrorKind::Internal(InternalErrorKind::Other(_)) => "internal_error",
        DomainErrorKind::External(ExternalErrorKind::Network) => "network_error",
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Domain Error: {:?}", self.error_kind)?;
        if let Some(source) = &self.source {
            write!(f, " caused by: {source}")?;
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

// This is where we translate errors from the `federation-auth` layer to the `domain` layer.
impl From<AuthError> for Error {
    fn from(err: AuthError) -> Self {
        let error_kind = match &err.error_kind {
            AuthErrorKind::OAuth(OAuthErrorKind::TokenExchangeFailed) => {
                DomainErrorKind::Federation(FederationErrorKind::TokenExchangeFailed)
            }
            AuthErrorKind::OAuth(OAuthErrorKind::ProfileFetchFailed) => {
                DomainErrorKind::Federation(FederationErrorKind::ProfileFetchFailed)
            }
            AuthErrorKind::OAuth(OAuthErrorKind::InvalidResponse) => {
                DomainErrorKind::Federation(FederationErrorKind::UnexpectedError)
            }
            AuthErrorKind::Identity(IdentityErrorKind::MalformedProfile) => {
                DomainErrorKind::Federation(FederationErrorKind::MalformedProfile)
            }
            AuthErrorKind::Identity(IdentityErrorKind::TransliterationFailed) => {
                DomainErrorKind::Federation(FederationErrorKind::TransliterationFailed)
            }
            AuthErrorKind::Http(HttpErrorKind::BuilderFailed) => DomainErrorKind::Internal(
                InternalErrorKind::Other("Failed to build reqwest client".to_string()),
            ),
            AuthErrorKind::Http(_) => DomainErrorKind::External(ExternalErrorKind::Network),
            AuthErrorKind::Config(_) => DomainErrorKind::Internal(InternalErrorKind::Config),
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}
