// SPDX-License-Identifier: PMPL-1.0-or-later
//! Remote collaborators the session talks to.
//!
//! The HTTP implementations live in `fleetq-client`; tests plug in
//! in-memory fakes.

use async_trait::async_trait;
use fleetq_filter::{
    Device, FilterOption, FilterOptions, KeyCatalog, Page, QueryRequest, QueryTemplate,
    TemplateSummary,
};
use serde_json::Value;

use crate::error::Result;

/// Executes device queries.
#[async_trait]
pub trait QueryService: Send + Sync {
    async fn query_devices(&self, request: &QueryRequest) -> Result<Page<Device>>;
}

/// Persists named filter trees.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Create a template, or update it when `template.id` is set.
    async fn save_template(&self, template: &QueryTemplate) -> Result<TemplateSummary>;

    async fn list_templates(&self, page: u32, size: u32) -> Result<Page<TemplateSummary>>;

    /// Fetch one template as raw JSON; its groups may be string-encoded.
    async fn fetch_template(&self, id: u64) -> Result<Value>;

    async fn delete_template(&self, id: u64) -> Result<()>;
}

/// Supplies field names and known values.
#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn get_filter_options(&self) -> Result<FilterOptions>;

    async fn get_values_for_key(&self, catalog: KeyCatalog, key: &str) -> Result<Vec<FilterOption>>;

    async fn get_device_field_values(&self, field: &str, size_hint: usize) -> Result<Vec<String>>;
}
