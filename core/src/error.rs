//! Error types for the fetch client.
//!
//! # Design
//! `ApiError` is what a strict caller sees. Every variant maps onto one
//! canonical error code so the normalizer can turn any failure into the
//! same `ErrorInfo` shape: HTTP failures keep their status, everything that
//! never produced a usable response collapses to status 500.

use thiserror::Error;

/// Code used when the transport itself failed (no response arrived).
pub const FETCH_ERROR: &str = "FETCH_ERROR";

/// Code used when a request or response body could not be (de)serialized.
pub const SERVER_ERROR: &str = "SERVER_ERROR";

/// Status reported for failures that did not carry an HTTP status.
pub const DEFAULT_ERROR_STATUS: u16 = 500;

/// Errors raised while building, sending, or decoding a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {status_text}")]
    Http { status: u16, status_text: String },

    /// The transport failed before a response was received.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be parsed as JSON.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

impl ApiError {
    /// Canonical error code for this failure.
    pub fn code(&self) -> String {
        match self {
            ApiError::Http { status, .. } => status.to_string(),
            ApiError::Transport(_) => FETCH_ERROR.to_string(),
            ApiError::Serialization(_) | ApiError::Deserialization(_) => SERVER_ERROR.to_string(),
        }
    }

    /// HTTP status reported for this failure.
    pub fn status(&self) -> u16 {
        match self {
            ApiError::Http { status, .. } => *status,
            _ => DEFAULT_ERROR_STATUS,
        }
    }

    /// Human-readable message; never empty.
    pub fn message(&self) -> String {
        match self {
            ApiError::Http { status, status_text } if status_text.trim().is_empty() => {
                format!("HTTP {status}")
            }
            ApiError::Http { status_text, .. } => status_text.clone(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Deserialization(err.to_string())
    }
}
