// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Response shapes specific to the HTTP API.
//!
//! The filter, device, and template shapes themselves live in
//! [`fleetq_filter::wire`]; this module only covers envelopes the REST API
//! adds around them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// ErrorResponse
// ---------------------------------------------------------------------------

/// Standard error response body from the inventory REST API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details (validation errors and the like).
    pub details: Option<Value>,
}

// ---------------------------------------------------------------------------
// ValueList
// ---------------------------------------------------------------------------

/// Known values for a device field. Servers answer either with a bare array
/// or with a `{ "list": [...] }` envelope, and entries are not always
/// strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ValueList {
    Bare(Vec<Value>),
    Wrapped {
        #[serde(default)]
        list: Vec<Value>,
    },
}

impl ValueList {
    /// Entries as display text; `null` entries are dropped.
    pub fn into_strings(self) -> Vec<String> {
        let items = match self {
            ValueList::Bare(items) | ValueList::Wrapped { list: items } => items,
        };
        items
            .into_iter()
            .filter_map(|item| match item {
                Value::Null => None,
                Value::String(s) => Some(s),
                other => Some(other.to_string()),
            })
            .collect()
    }
}
