use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use domain::error::{DomainErrorKind, Error as DomainError, ExternalErrorKind, InternalErrorKind};
use log::*;

use crate::response::error_page;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error(DomainError);

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

// List of possible StatusCode variants https://docs.rs/http/latest/http/status/struct.StatusCode.html#associatedconstant.UNPROCESSABLE_ENTITY
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self.0.error_kind {
            DomainErrorKind::Federation(_) => error_page::render(&self.0),
            DomainErrorKind::Internal(InternalErrorKind::Config) => {
                error!("Broker is misconfigured: {}", self.0);
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR").into_response()
            }
            DomainErrorKind::Internal(InternalErrorKind::Other(_)) => {
                error!("Internal error: {}", self.0);
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR").into_response()
            }
            DomainErrorKind::External(ExternalErrorKind::Network) => {
                warn!("Upstream network error: {}", self.0);
                (StatusCode::BAD_GATEWAY, "BAD GATEWAY").into_response()
            }
        }
    }
}

impl<E> From<E> for Error
where
    E: Into<DomainError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
