// SPDX-License-Identifier: PMPL-1.0-or-later
//! Filter configuration.
//!
//! Defaults:
//! - summary_max_length: 120
//! - value_size_hint: 50
//! - default_page_size: 20

use serde::{Deserialize, Serialize};

/// Tunables shared by the summary generator, catalog warming, and the
/// query executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Upper bound (in characters) on generated query summaries.
    pub summary_max_length: usize,
    /// Size hint passed when fetching known values for a device field.
    pub value_size_hint: usize,
    /// Page size used when the caller does not pick one.
    pub default_page_size: u32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            summary_max_length: 120,
            value_size_hint: 50,
            default_page_size: 20,
        }
    }
}
