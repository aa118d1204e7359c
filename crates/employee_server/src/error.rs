//! HTTP-facing and startup error types.
//!
//! # Invariants
//! - Malformed requests map to 400 and never reach the store; unreadable
//!   bodies keep the rejection's status (413 over the body limit).
//! - Unsupported methods on API routes map to 405.
//! - Store failures and timeouts map to 500 carrying the underlying text.
//! - Error bodies are JSON: `{"error": "<message>"}`.

use axum::{
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use employee_core::db::DbError;
use employee_core::RepoError;
use log::{error, warn};
use serde_json::json;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

use crate::config::ConfigError;

#[derive(Debug)]
pub enum ApiError {
    /// Request body is not a valid JSON payload for the endpoint.
    MalformedPayload(String),
    /// Body could not be read (too large, aborted stream).
    BodyRejected { status: StatusCode, message: String },
    /// Path id is not an integer.
    InvalidId(String),
    /// Route exists but does not accept the request method.
    MethodNotAllowed,
    /// Store operation failed.
    Store(String),
    /// Store work exceeded the per-request bound.
    Timeout(Duration),
    /// Worker failure unrelated to the store.
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MalformedPayload(_) | Self::InvalidId(_) => StatusCode::BAD_REQUEST,
            Self::BodyRejected { status, .. } => *status,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Store(_) | Self::Timeout(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedPayload(message) => write!(f, "invalid input: {message}"),
            Self::BodyRejected { message, .. } => write!(f, "invalid input: {message}"),
            Self::InvalidId(message) => write!(f, "invalid id: {message}"),
            Self::MethodNotAllowed => f.write_str("method not allowed"),
            Self::Store(message) => f.write_str(message),
            Self::Timeout(limit) => {
                write!(f, "store operation timed out after {}s", limit.as_secs())
            }
            Self::Internal(message) => write!(f, "internal error: {message}"),
        }
    }
}

impl Error for ApiError {}

impl From<RepoError> for ApiError {
    fn from(value: RepoError) -> Self {
        Self::Store(value.to_string())
    }
}

impl From<DbError> for ApiError {
    fn from(value: DbError) -> Self {
        Self::Store(value.to_string())
    }
}

impl From<BytesRejection> for ApiError {
    fn from(value: BytesRejection) -> Self {
        Self::BodyRejected {
            status: value.status(),
            message: value.body_text(),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(value: serde_json::Error) -> Self {
        Self::MalformedPayload(value.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            error!(
                "event=http_error module=http status=error http_status={} error={message}",
                status.as_u16()
            );
        } else {
            warn!(
                "event=http_error module=http status=rejected http_status={} error={message}",
                status.as_u16()
            );
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Fatal errors while bringing the server up.
#[derive(Debug)]
pub enum ServerError {
    Config(ConfigError),
    Logging(String),
    Store(DbError),
    Io(std::io::Error),
}

impl Display for ServerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "configuration error: {err}"),
            Self::Logging(message) => write!(f, "logging setup failed: {message}"),
            Self::Store(err) => write!(f, "store setup failed: {err}"),
            Self::Io(err) => write!(f, "server i/o failed: {err}"),
        }
    }
}

impl Error for ServerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Logging(_) => None,
        }
    }
}

impl From<ConfigError> for ServerError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<DbError> for ServerError {
    fn from(value: DbError) -> Self {
        Self::Store(value)
    }
}

impl From<std::io::Error> for ServerError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}
