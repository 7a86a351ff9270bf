// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Session collaborator implementations backed by [`FleetqClient`].

use async_trait::async_trait;
use fleetq_filter::{
    Device, FilterOption, FilterOptions, KeyCatalog, Page, QueryRequest, QueryTemplate,
    TemplateSummary,
};
use fleetq_session::{CatalogService, QueryService, TemplateStore};
use serde_json::Value;

use crate::client::FleetqClient;

type SessionResult<T> = fleetq_session::Result<T>;

#[async_trait]
impl QueryService for FleetqClient {
    async fn query_devices(&self, request: &QueryRequest) -> SessionResult<Page<Device>> {
        Ok(FleetqClient::query_devices(self, request).await?)
    }
}

#[async_trait]
impl TemplateStore for FleetqClient {
    async fn save_template(&self, template: &QueryTemplate) -> SessionResult<TemplateSummary> {
        Ok(FleetqClient::save_template(self, template).await?)
    }

    async fn list_templates(&self, page: u32, size: u32) -> SessionResult<Page<TemplateSummary>> {
        Ok(FleetqClient::list_templates(self, page, size).await?)
    }

    async fn fetch_template(&self, id: u64) -> SessionResult<Value> {
        Ok(FleetqClient::fetch_template(self, id).await?)
    }

    async fn delete_template(&self, id: u64) -> SessionResult<()> {
        Ok(FleetqClient::delete_template(self, id).await?)
    }
}

#[async_trait]
impl CatalogService for FleetqClient {
    async fn get_filter_options(&self) -> SessionResult<FilterOptions> {
        Ok(FleetqClient::get_filter_options(self).await?)
    }

    async fn get_values_for_key(&self, catalog: KeyCatalog, key: &str) -> SessionResult<Vec<FilterOption>> {
        Ok(FleetqClient::get_values_for_key(self, catalog, key).await?)
    }

    async fn get_device_field_values(&self, field: &str, size_hint: usize) -> SessionResult<Vec<String>> {
        Ok(FleetqClient::get_device_field_values(self, field, size_hint).await?)
    }
}
