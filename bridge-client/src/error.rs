//! Client-side error types.

use std::time::Duration;

use hyper::StatusCode;
use thiserror::Error;

/// Why a remote call failed.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be built.
    #[error("invalid request: {reason}")]
    InvalidRequest {
        /// Additional context.
        reason: String,
    },
    /// The server could not be reached or the exchange broke off.
    #[error("connection failed: {reason}")]
    Connection {
        /// Additional context.
        reason: String,
    },
    /// No response arrived within the configured timeout.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    /// The server answered with a non-2xx status.
    #[error("server returned {status}: {message}")]
    Status {
        /// HTTP status returned by the server.
        status: StatusCode,
        /// The server's `error` message, or the raw body.
        message: String,
    },
    /// A 2xx body could not be decoded.
    #[error("failed to decode response: {reason}")]
    Decode {
        /// Additional context.
        reason: String,
    },
}

impl TransportError {
    pub(crate) fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    pub(crate) fn connection(reason: impl Into<String>) -> Self {
        Self::Connection {
            reason: reason.into(),
        }
    }

    pub(crate) fn decode(reason: impl Into<String>) -> Self {
        Self::Decode {
            reason: reason.into(),
        }
    }
}

/// The single error type raised by [`crate::BridgeClient`].
#[derive(Debug, Error)]
#[error("{operation} failed: {cause}")]
pub struct ClientError {
    operation: String,
    #[source]
    cause: TransportError,
}

impl ClientError {
    pub(crate) fn new(operation: impl Into<String>, cause: TransportError) -> Self {
        Self {
            operation: operation.into(),
            cause,
        }
    }

    /// Name of the remote operation that failed.
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Underlying cause.
    #[must_use]
    pub fn cause(&self) -> &TransportError {
        &self.cause
    }

    /// HTTP status, when the server answered.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match &self.cause {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The server's error message, when the server answered with one.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match &self.cause {
            TransportError::Status { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// Result alias for client calls.
pub type ClientResult<T> = Result<T, ClientError>;
