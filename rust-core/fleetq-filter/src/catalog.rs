// SPDX-License-Identifier: PMPL-1.0-or-later
//! Field option catalogs keyed by filter type.
//!
//! The catalog service hands out one option list per filter type (device
//! fields, node label keys, node taint keys). [`FilterCatalog`] stores them
//! behind a closed `FilterType -> options` mapping so every lookup is an
//! exhaustive match.

use serde::{Deserialize, Deserializer, Serialize};

use crate::{ConditionType, FilterType};

/// A selectable field (or value) with its display label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FilterOption {
    pub label: String,
    pub value: String,
}

impl FilterOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    /// Option whose label is its value.
    pub fn plain(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }
}

impl<'de> Deserialize<'de> for FilterOption {
    /// Accepts `{"label": .., "value": ..}` or a bare string.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Plain(String),
            Labelled {
                #[serde(default)]
                label: Option<String>,
                value: String,
            },
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Plain(value) => FilterOption::plain(value),
            Raw::Labelled { label, value } => match label {
                Some(label) if !label.is_empty() => FilterOption::new(label, value),
                _ => FilterOption::plain(value),
            },
        })
    }
}

/// Conditions usable on a block of the given filter type.
///
/// Device attributes are ordered and may be empty; labels and taints only
/// support equality, membership, and existence.
pub fn allowed_conditions(filter_type: FilterType) -> &'static [ConditionType] {
    const KEYED: [ConditionType; 6] = [
        ConditionType::Equal,
        ConditionType::NotEqual,
        ConditionType::Exists,
        ConditionType::NotExists,
        ConditionType::In,
        ConditionType::NotIn,
    ];

    match filter_type {
        FilterType::Device => &ConditionType::ALL,
        FilterType::NodeLabel | FilterType::Taint => &KEYED,
    }
}

/// Field chosen for a freshly added block: the first option of its catalog,
/// or empty if that catalog has not loaded yet.
pub fn default_field_for(filter_type: FilterType, catalog: &FilterCatalog) -> String {
    catalog
        .options(filter_type)
        .first()
        .map(|opt| opt.value.clone())
        .unwrap_or_default()
}

/// Option lists for every filter type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCatalog {
    device_fields: Vec<FilterOption>,
    node_label_keys: Vec<FilterOption>,
    node_taint_keys: Vec<FilterOption>,
}

impl FilterCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ordered options for a filter type.
    pub fn options(&self, filter_type: FilterType) -> &[FilterOption] {
        match filter_type {
            FilterType::Device => &self.device_fields,
            FilterType::NodeLabel => &self.node_label_keys,
            FilterType::Taint => &self.node_taint_keys,
        }
    }

    /// Replace the options for a filter type.
    pub fn set_options(&mut self, filter_type: FilterType, options: Vec<FilterOption>) {
        let slot = match filter_type {
            FilterType::Device => &mut self.device_fields,
            FilterType::NodeLabel => &mut self.node_label_keys,
            FilterType::Taint => &mut self.node_taint_keys,
        };
        *slot = options;
    }

    /// Builder-style variant of [`FilterCatalog::set_options`].
    pub fn with_options(mut self, filter_type: FilterType, options: Vec<FilterOption>) -> Self {
        self.set_options(filter_type, options);
        self
    }

    /// Whether the catalog for a filter type has any entries.
    pub fn is_loaded(&self, filter_type: FilterType) -> bool {
        !self.options(filter_type).is_empty()
    }

    /// Display label for a field, if the catalog knows it.
    pub fn label_for(&self, filter_type: FilterType, field: &str) -> Option<&str> {
        self.options(filter_type)
            .iter()
            .find(|opt| opt.value == field)
            .map(|opt| opt.label.as_str())
    }
}
