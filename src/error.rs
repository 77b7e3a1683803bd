//! Classified errors.
//!
//! Every failure that leaves the contract layer is a [`ClassifiedError`]:
//! one [`ErrorKind`] from a closed set, a human-readable message, and the
//! HTTP status when a response was received. Callers never see a
//! `reqwest::Error` or a raw payload.
//!
//! | Kind | Meaning |
//! |------|---------|
//! | [`ErrorKind::Validation`] | request rejected locally, never dispatched |
//! | [`ErrorKind::Network`] | dispatched, no response (connect failure, timeout) |
//! | [`ErrorKind::Server`] | response with a failing HTTP status |
//! | [`ErrorKind::Schema`] | successful status, payload failed its shape guard |

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// The closed taxonomy of client-side failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Network,
    Server,
    Schema,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Network => "network",
            ErrorKind::Server => "server",
            ErrorKind::Schema => "schema",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized failure.
///
/// `Display` renders the message verbatim so it can be shown next to the
/// form that triggered it.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{message}")]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl ClassifiedError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Validation,
            message: message.into(),
            status_code: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Network,
            message: message.into(),
            status_code: None,
        }
    }

    pub fn server(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Server,
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Schema,
            message: message.into(),
            status_code: None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self.kind {
            ErrorKind::Network => true,
            ErrorKind::Server => matches!(self.status_code, Some(429) | Some(500..=599)),
            ErrorKind::Validation | ErrorKind::Schema => false,
        }
    }
}

/// Result alias for contract-layer calls.
pub type ApiResult<T> = std::result::Result<T, ClassifiedError>;
