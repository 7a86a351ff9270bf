// SPDX-License-Identifier: PMPL-1.0-or-later
//! Blocks, groups, and the partial updates applied to them.

use serde::{Deserialize, Serialize};

use crate::{ConditionType, FilterType, LogicalOperator};

/// A block's comparison value.
///
/// Membership conditions (`in`, `notIn`) hold a list; every other condition
/// holds a single string, possibly empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Single(String),
    List(Vec<String>),
}

impl FilterValue {
    /// The empty single value.
    pub fn empty() -> Self {
        FilterValue::Single(String::new())
    }

    /// Number of entries (0 or 1 for a single value).
    pub fn len(&self) -> usize {
        match self {
            FilterValue::Single(s) if s.is_empty() => 0,
            FilterValue::Single(_) => 1,
            FilterValue::List(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_list(&self) -> bool {
        matches!(self, FilterValue::List(_))
    }

    /// First entry, if any.
    pub fn first(&self) -> Option<&str> {
        match self {
            FilterValue::Single(s) if s.is_empty() => None,
            FilterValue::Single(s) => Some(s),
            FilterValue::List(items) => items.first().map(String::as_str),
        }
    }

    /// Borrowed view of all entries.
    pub fn entries(&self) -> Vec<&str> {
        match self {
            FilterValue::Single(s) if s.is_empty() => Vec::new(),
            FilterValue::Single(s) => vec![s.as_str()],
            FilterValue::List(items) => items.iter().map(String::as_str).collect(),
        }
    }
}

impl Default for FilterValue {
    fn default() -> Self {
        FilterValue::empty()
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::Single(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::Single(s)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(items: Vec<String>) -> Self {
        FilterValue::List(items)
    }
}

impl From<Vec<&str>> for FilterValue {
    fn from(items: Vec<&str>) -> Self {
        FilterValue::List(items.into_iter().map(str::to_string).collect())
    }
}

fn default_active() -> bool {
    true
}

/// One leaf condition.
///
/// `field` and `key` name the same thing and are kept equal by
/// [`crate::sync`]; both are sent on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterBlock {
    pub id: String,
    #[serde(rename = "type")]
    pub filter_type: FilterType,
    pub condition_type: ConditionType,
    pub field: String,
    pub key: String,
    pub value: FilterValue,
    /// Joins this block to its neighbour within the group.
    pub operator: LogicalOperator,
    /// Inactive blocks stay editable but are never executed or persisted.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// An ordered list of blocks joined by one operator.
///
/// The same `operator` also joins this group to the next one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterGroup {
    pub id: String,
    pub blocks: Vec<FilterBlock>,
    pub operator: LogicalOperator,
}

impl FilterGroup {
    pub fn block(&self, block_id: &str) -> Option<&FilterBlock> {
        self.blocks.iter().find(|b| b.id == block_id)
    }

    /// Whether any block in the group would be executed.
    pub fn has_active_blocks(&self) -> bool {
        self.blocks.iter().any(|b| b.is_active)
    }
}

/// Partial update for a group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupPatch {
    pub operator: Option<LogicalOperator>,
}

impl GroupPatch {
    pub fn operator(operator: LogicalOperator) -> Self {
        Self {
            operator: Some(operator),
        }
    }
}

/// Partial update for a block. Absent fields are left untouched.
///
/// There is no operator here: a block's operator only ever follows its
/// group's (see [`GroupPatch`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockPatch {
    pub filter_type: Option<FilterType>,
    pub condition_type: Option<ConditionType>,
    pub field: Option<String>,
    pub key: Option<String>,
    /// Raw input; normalized against the block's effective condition.
    pub value: Option<FilterValue>,
    pub is_active: Option<bool>,
}

impl BlockPatch {
    pub fn field(field: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            ..Self::default()
        }
    }

    pub fn key(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::default()
        }
    }

    pub fn value(value: impl Into<FilterValue>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn condition(condition: ConditionType) -> Self {
        Self {
            condition_type: Some(condition),
            ..Self::default()
        }
    }

    pub fn active(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_untagged_serde() {
        let single: FilterValue = serde_json::from_str("\"eth0\"").unwrap();
        assert_eq!(single, FilterValue::Single("eth0".to_string()));

        let list: FilterValue = serde_json::from_str(r#"["a","b"]"#).unwrap();
        assert_eq!(list, FilterValue::from(vec!["a", "b"]));
        assert_eq!(serde_json::to_string(&list).unwrap(), r#"["a","b"]"#);
    }

    #[test]
    fn test_value_len_and_first() {
        assert_eq!(FilterValue::empty().len(), 0);
        assert!(FilterValue::empty().first().is_none());
        assert_eq!(FilterValue::from("x").first(), Some("x"));
        assert_eq!(FilterValue::from(vec!["a", "b", "c"]).len(), 3);
        assert!(FilterValue::List(Vec::new()).is_empty());
    }

    #[test]
    fn test_block_wire_shape() {
        let block = FilterBlock {
            id: "b1".to_string(),
            filter_type: FilterType::Device,
            condition_type: ConditionType::Equal,
            field: "ip".to_string(),
            key: "ip".to_string(),
            value: FilterValue::from("10.0.0.1"),
            operator: LogicalOperator::And,
            is_active: true,
        };
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "device");
        assert_eq!(json["conditionType"], "equal");
        assert_eq!(json["isActive"], true);
        assert_eq!(json["operator"], "AND");
    }

    #[test]
    fn test_block_is_active_defaults_true() {
        let json = r#"{"id":"b","type":"taint","conditionType":"exists","field":"k","key":"k","value":"","operator":"OR"}"#;
        let block: FilterBlock = serde_json::from_str(json).unwrap();
        assert!(block.is_active);
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(BlockPatch::default().is_empty());
        assert!(!BlockPatch::field("ip").is_empty());
    }
}
