// SPDX-License-Identifier: PMPL-1.0-or-later
//! Session errors

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Rejected locally before any request was sent.
    #[error("Nothing to run: {0}")]
    Validation(String),

    /// A query submission is already in flight.
    #[error("A query is already running")]
    Busy,

    #[error("Not found: {0}")]
    NotFound(String),

    /// The collaborator could not be reached or answered with an error.
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Lock poisoned: internal concurrency error")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, SessionError>;
