// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Error types for the fleetq client SDK.
//!
//! All fallible operations in this crate return [`Result<T>`], an alias for
//! `std::result::Result<T, FleetqError>`. When the client is used through
//! the session traits, errors are folded into
//! [`fleetq_session::SessionError`].

use fleetq_session::SessionError;
use thiserror::Error;

/// Error type for fleetq client operations.
#[derive(Error, Debug)]
pub enum FleetqError {
    /// The requested template (or other resource) does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Authentication or authorization failed. Check API key / bearer token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// An underlying HTTP / network transport error from `reqwest`.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The server returned an HTTP error status.
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code (e.g. 500, 502, 503).
        status: u16,
        /// Message from the response body, or the bare status.
        message: String,
    },

    /// Client-side validation failed before the request was sent.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The request exceeded the configured timeout.
    #[error("Timeout after {0}ms")]
    Timeout(u64),
}

/// Crate-level result alias using [`FleetqError`].
pub type Result<T> = std::result::Result<T, FleetqError>;

impl From<FleetqError> for SessionError {
    fn from(err: FleetqError) -> Self {
        match err {
            FleetqError::NotFound(what) => SessionError::NotFound(what),
            FleetqError::Validation(msg) => SessionError::Validation(msg),
            other => SessionError::Transport(other.to_string()),
        }
    }
}
