// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Filter catalogs: which fields exist, and which values they take.

use fleetq_filter::{FilterOption, FilterOptions, KeyCatalog};

use crate::client::FleetqClient;
use crate::error::Result;
use crate::types::ValueList;

impl FleetqClient {
    /// Device fields plus node label and taint keys.
    pub async fn get_filter_options(&self) -> Result<FilterOptions> {
        self.get("/api/v1/filters/options", &[]).await
    }

    /// Known values for a node label or taint key.
    pub async fn get_values_for_key(&self, catalog: KeyCatalog, key: &str) -> Result<Vec<FilterOption>> {
        let path = format!("/api/v1/filters/{}/values", catalog.as_str());
        self.get(&path, &[("key", key)]).await
    }

    /// Known values for a device field, at most about `size_hint` of them.
    pub async fn get_device_field_values(&self, field: &str, size_hint: usize) -> Result<Vec<String>> {
        let size = size_hint.to_string();
        let values: ValueList = self
            .get("/api/v1/devices/field-values", &[("field", field), ("size", size.as_str())])
            .await?;
        Ok(values.into_strings())
    }
}
