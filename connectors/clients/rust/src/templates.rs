// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Query template storage.
//!
//! Templates are created and updated through the same endpoint; the body
//! carries an `id` only when updating.

use fleetq_filter::{Page, QueryTemplate, TemplateSummary};
use serde_json::Value;

use crate::client::FleetqClient;
use crate::error::Result;

impl FleetqClient {
    pub async fn save_template(&self, template: &QueryTemplate) -> Result<TemplateSummary> {
        self.post("/api/v1/query-templates", template).await
    }

    /// List templates, one page at a time. `page` is 1-based.
    pub async fn list_templates(&self, page: u32, size: u32) -> Result<Page<TemplateSummary>> {
        let page = page.to_string();
        let size = size.to_string();
        self.get("/api/v1/query-templates", &[("page", page.as_str()), ("size", size.as_str())])
            .await
    }

    /// Fetch one template as raw JSON. Older servers store `groups` as a
    /// JSON string; decode with [`fleetq_filter::template::load_template`].
    pub async fn fetch_template(&self, id: u64) -> Result<Value> {
        self.get(&format!("/api/v1/query-templates/{id}"), &[]).await
    }

    pub async fn delete_template(&self, id: u64) -> Result<()> {
        self.delete(&format!("/api/v1/query-templates/{id}")).await
    }
}
