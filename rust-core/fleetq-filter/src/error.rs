// SPDX-License-Identifier: PMPL-1.0-or-later
//! Filter error types.
//!
//! The engine and serializer are total and never produce these; they only
//! surface when parsing tags from user text or encoding a tree.

use thiserror::Error;

/// Errors raised while parsing or encoding filter expressions.
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("unknown filter type: {0}")]
    UnknownFilterType(String),

    #[error("unknown condition type: {0}")]
    UnknownCondition(String),

    #[error("unknown logical operator: {0}")]
    UnknownOperator(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
