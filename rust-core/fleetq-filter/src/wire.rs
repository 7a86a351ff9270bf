// SPDX-License-Identifier: PMPL-1.0-or-later
//! Wire shapes exchanged with the inventory, template, and catalog
//! services.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::catalog::{FilterCatalog, FilterOption};
use crate::{ConditionType, FilterType, LogicalOperator};

/// A block as sent to the remote side: the value is always one string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireBlock {
    pub id: String,
    #[serde(rename = "type")]
    pub filter_type: FilterType,
    pub condition_type: ConditionType,
    pub field: String,
    pub key: String,
    pub value: String,
    pub operator: LogicalOperator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireGroup {
    pub id: String,
    pub blocks: Vec<WireBlock>,
    pub operator: LogicalOperator,
}

/// Paginated device query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub groups: Vec<WireGroup>,
    pub page: u32,
    pub size: u32,
}

/// One page of results from any list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Page<T> {
    pub list: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub size: u32,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            list: Vec::new(),
            total: 0,
            page: 1,
            size: 0,
        }
    }
}

impl<T> Page<T> {
    /// Whether pages exist after this one.
    pub fn has_more(&self) -> bool {
        u64::from(self.page) * u64::from(self.size) < self.total
    }
}

/// A stored template as it appears in listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateSummary {
    pub id: u64,
    pub name: String,
    pub description: String,
}

/// A device record. The inventory owns the schema, so attributes are kept
/// as an open JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Device(pub Map<String, Value>);

impl Device {
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.0.get(attribute)
    }

    /// Attribute rendered as display text; strings are unquoted.
    pub fn text(&self, attribute: &str) -> Option<String> {
        self.get(attribute).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    pub fn attributes(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }
}

/// Option lists returned by the catalog service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterOptions {
    pub device_fields: Vec<FilterOption>,
    pub node_label_keys: Vec<FilterOption>,
    pub node_taint_keys: Vec<FilterOption>,
}

impl FilterOptions {
    pub fn into_catalog(self) -> FilterCatalog {
        FilterCatalog::new()
            .with_options(FilterType::Device, self.device_fields)
            .with_options(FilterType::NodeLabel, self.node_label_keys)
            .with_options(FilterType::Taint, self.node_taint_keys)
    }
}

/// Keyed catalogs whose values are looked up per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyCatalog {
    NodeLabel,
    Taint,
}

impl KeyCatalog {
    /// Keyed catalog backing a filter type; device fields have their own
    /// value endpoint.
    pub fn for_filter_type(filter_type: FilterType) -> Option<Self> {
        match filter_type {
            FilterType::NodeLabel => Some(KeyCatalog::NodeLabel),
            FilterType::Taint => Some(KeyCatalog::Taint),
            FilterType::Device => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            KeyCatalog::NodeLabel => "nodeLabel",
            KeyCatalog::Taint => "taint",
        }
    }
}
