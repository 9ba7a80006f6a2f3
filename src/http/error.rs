//! Error taxonomy for the request/response layer.
//!
//! # Categories
//! - `ApiError`: a status code plus message, rendered as a bodiless response
//! - `SendError`: the response pipeline was misused (programming error)
//! - `HandlerError`: what a handler may fail with, either recoverable (`Api`)
//!   or opaque (`Unhandled`)
//! - `AdapterError`: what escapes the adapter; never rendered, the server
//!   aborts the connection instead

use axum::http::StatusCode;
use thiserror::Error;

/// Boxed error type for opaque failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A typed error carrying the HTTP status it should be answered with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{status}: {message}")]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Create a new API error.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// 400 Bad Request.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 500 Internal Server Error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Misuse of the response pipeline.
#[derive(Debug, Error)]
pub enum SendError {
    /// `send` or `json` was called on a response that already finished.
    #[error("response already finished")]
    Finished,

    /// The value handed to `json` could not be serialized.
    #[error("failed to serialize JSON body: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failure returned by a request handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Recovered by the adapter and turned into a status-only response.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Anything else. Propagates past the adapter untouched.
    #[error("unhandled handler error: {0}")]
    Unhandled(BoxError),
}

impl HandlerError {
    /// Wrap an arbitrary error as unhandled.
    pub fn unhandled<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Unhandled(err.into())
    }
}

impl From<SendError> for HandlerError {
    fn from(err: SendError) -> Self {
        Self::Unhandled(Box::new(err))
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Unhandled(Box::new(err))
    }
}

impl From<std::io::Error> for HandlerError {
    fn from(err: std::io::Error) -> Self {
        Self::Unhandled(Box::new(err))
    }
}

/// Failure escaping `RequestAdapter::handle`.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The handler failed with something other than an `ApiError`.
    #[error(transparent)]
    Unhandled(BoxError),
}
