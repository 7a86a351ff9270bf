// SPDX-License-Identifier: PMPL-1.0-or-later
//! fleetq Filter
//!
//! Composable filter expressions over a device fleet.
//! Groups of blocks select devices by attribute, node label, or taint.
//! This crate owns the expression model and everything that keeps it
//! well-formed: value normalization, field/key synchronization, the
//! copy-on-write mutation engine, template (de)serialization, and the
//! human-readable query summary.

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod normalize;
pub mod summary;
pub mod sync;
pub mod template;
pub mod wire;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use catalog::{allowed_conditions, default_field_for, FilterCatalog, FilterOption};
pub use config::FilterConfig;
pub use engine::{BlockEdit, FilterTree, WarmRequest};
pub use error::FilterError;
pub use model::{BlockPatch, FilterBlock, FilterGroup, FilterValue, GroupPatch};
pub use normalize::{normalize_for_transport, normalize_on_input};
pub use summary::{summarize, summarize_with_labels};
pub use template::{
    from_persisted, load_template, to_persisted, to_wire_groups, LoadedTemplate, QueryTemplate,
    TemplateDraft,
};
pub use wire::{
    Device, FilterOptions, KeyCatalog, Page, QueryRequest, TemplateSummary, WireBlock, WireGroup,
};

/// Which catalog a block's field comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterType {
    NodeLabel,
    Taint,
    Device,
}

impl FilterType {
    /// All filter types in catalog order.
    pub const ALL: [FilterType; 3] = [FilterType::NodeLabel, FilterType::Taint, FilterType::Device];

    /// Wire tag used by the inventory service.
    pub fn as_str(self) -> &'static str {
        match self {
            FilterType::NodeLabel => "nodeLabel",
            FilterType::Taint => "taint",
            FilterType::Device => "device",
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterType {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match canonical_tag(s).as_str() {
            "nodelabel" | "label" => Ok(FilterType::NodeLabel),
            "taint" | "nodetaint" => Ok(FilterType::Taint),
            "device" => Ok(FilterType::Device),
            _ => Err(FilterError::UnknownFilterType(s.to_string())),
        }
    }
}

/// Comparison semantics of a single block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionType {
    Equal,
    NotEqual,
    Contains,
    NotContains,
    In,
    NotIn,
    Exists,
    NotExists,
    GreaterThan,
    LessThan,
    IsEmpty,
    IsNotEmpty,
}

impl ConditionType {
    /// All condition kinds in declaration order.
    pub const ALL: [ConditionType; 12] = [
        ConditionType::Equal,
        ConditionType::NotEqual,
        ConditionType::Contains,
        ConditionType::NotContains,
        ConditionType::In,
        ConditionType::NotIn,
        ConditionType::Exists,
        ConditionType::NotExists,
        ConditionType::GreaterThan,
        ConditionType::LessThan,
        ConditionType::IsEmpty,
        ConditionType::IsNotEmpty,
    ];

    /// Membership conditions carry a list of values.
    pub fn is_multi_value(self) -> bool {
        matches!(self, ConditionType::In | ConditionType::NotIn)
    }

    /// Conditions whose value is ignored by the remote evaluator.
    pub fn is_valueless(self) -> bool {
        matches!(
            self,
            ConditionType::Exists
                | ConditionType::NotExists
                | ConditionType::IsEmpty
                | ConditionType::IsNotEmpty
        )
    }

    /// Whether this condition may be used on a block of the given type.
    pub fn is_valid_for(self, filter_type: FilterType) -> bool {
        allowed_conditions(filter_type).contains(&self)
    }

    /// Operator text placed between field and value in summaries.
    pub fn symbol(self) -> &'static str {
        match self {
            ConditionType::Equal => "=",
            ConditionType::NotEqual => "!=",
            ConditionType::Contains => " contains ",
            ConditionType::NotContains => " not contains ",
            ConditionType::In => " in ",
            ConditionType::NotIn => " not in ",
            ConditionType::Exists => " exists",
            ConditionType::NotExists => " not exists",
            ConditionType::GreaterThan => ">",
            ConditionType::LessThan => "<",
            ConditionType::IsEmpty => " is empty",
            ConditionType::IsNotEmpty => " is not empty",
        }
    }

    /// Wire tag used by the inventory service.
    pub fn as_str(self) -> &'static str {
        match self {
            ConditionType::Equal => "equal",
            ConditionType::NotEqual => "notEqual",
            ConditionType::Contains => "contains",
            ConditionType::NotContains => "notContains",
            ConditionType::In => "in",
            ConditionType::NotIn => "notIn",
            ConditionType::Exists => "exists",
            ConditionType::NotExists => "notExists",
            ConditionType::GreaterThan => "greaterThan",
            ConditionType::LessThan => "lessThan",
            ConditionType::IsEmpty => "isEmpty",
            ConditionType::IsNotEmpty => "isNotEmpty",
        }
    }
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConditionType {
    type Err = FilterError;

    /// Accepts wire tags in any case or separator style, plus the
    /// comparison symbols.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "=" | "==" => return Ok(ConditionType::Equal),
            "!=" | "<>" => return Ok(ConditionType::NotEqual),
            ">" => return Ok(ConditionType::GreaterThan),
            "<" => return Ok(ConditionType::LessThan),
            "~" => return Ok(ConditionType::Contains),
            "!~" => return Ok(ConditionType::NotContains),
            _ => {}
        }
        ConditionType::ALL
            .into_iter()
            .find(|c| canonical_tag(c.as_str()) == canonical_tag(s))
            .ok_or_else(|| FilterError::UnknownCondition(s.to_string()))
    }
}

/// Logical connective between blocks, and between groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

impl LogicalOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogicalOperator {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match canonical_tag(s).as_str() {
            "and" | "&&" => Ok(LogicalOperator::And),
            "or" | "||" => Ok(LogicalOperator::Or),
            _ => Err(FilterError::UnknownOperator(s.to_string())),
        }
    }
}

/// Lowercase with `_`, `-` and spaces removed, so `not_equal`, `not-equal`
/// and `NotEqual` compare equal.
fn canonical_tag(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Mint a fresh opaque identifier for a group or block.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
