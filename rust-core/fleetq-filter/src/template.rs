// SPDX-License-Identifier: PMPL-1.0-or-later
//! Template serialization.
//!
//! Saving deep-copies the tree, drops inactive blocks, re-syncs field/key,
//! and flattens list values into comma-joined strings. Loading is lenient:
//! string-encoded groups are decoded, anything that is not an array becomes
//! empty, missing or duplicate ids are re-minted, and every block is
//! re-synced and re-normalized. Loading never fails.
//!
//! Loading is idempotent: feeding a loaded tree back through
//! [`from_persisted`] yields the same tree.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::engine::FilterTree;
use crate::normalize::{normalize_for_transport, normalize_on_input};
use crate::sync::sync_block;
use crate::wire::{WireBlock, WireGroup};
use crate::{
    new_id, ConditionType, FilterBlock, FilterGroup, FilterType, FilterValue, LogicalOperator,
};

/// How deep string-encoded group payloads are unwrapped.
const MAX_ENCODING_DEPTH: usize = 2;

static MISSING: Value = Value::Null;

/// A named, persisted filter tree in wire form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryTemplate {
    /// Present only when updating an existing template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub groups: Vec<WireGroup>,
}

/// Metadata for a template about to be saved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateDraft {
    /// Id of the template being updated; `None` creates a new one.
    pub id: Option<u64>,
    pub name: String,
    pub description: String,
}

impl TemplateDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn updating(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }
}

/// A template reconstituted from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedTemplate {
    pub id: Option<u64>,
    pub name: String,
    pub description: String,
    pub tree: FilterTree,
}

/// Flatten groups into wire form.
///
/// With `active_only`, inactive blocks are dropped, and so is any group
/// left empty by that (a group that was already empty is kept).
pub fn to_wire_groups(groups: &[FilterGroup], active_only: bool) -> Vec<WireGroup> {
    groups
        .iter()
        .filter_map(|group| {
            let blocks: Vec<WireBlock> = group
                .blocks
                .iter()
                .filter(|b| b.is_active || !active_only)
                .map(to_wire_block)
                .collect();
            if active_only && blocks.is_empty() && !group.blocks.is_empty() {
                debug!(group_id = %group.id, "Dropping group with no active blocks");
                return None;
            }
            Some(WireGroup {
                id: group.id.clone(),
                blocks,
                operator: group.operator,
            })
        })
        .collect()
}

fn to_wire_block(block: &FilterBlock) -> WireBlock {
    let mut block = block.clone();
    sync_block(&mut block);
    WireBlock {
        value: normalize_for_transport(&block.value, block.condition_type),
        id: block.id,
        filter_type: block.filter_type,
        condition_type: block.condition_type,
        field: block.field,
        key: block.key,
        operator: block.operator,
        is_active: Some(block.is_active),
    }
}

/// Build the template body for the store.
pub fn to_persisted(groups: &[FilterGroup], draft: &TemplateDraft, active_only: bool) -> QueryTemplate {
    QueryTemplate {
        id: draft.id,
        name: draft.name.clone(),
        description: draft.description.clone(),
        groups: to_wire_groups(groups, active_only),
    }
}

/// Decode the groups of a stored template (or a bare groups payload) into
/// a well-formed tree. Never fails; unusable input yields no groups.
pub fn from_persisted(raw: &Value) -> Vec<FilterGroup> {
    let groups_value = match raw {
        Value::Object(map) => map.get("groups").unwrap_or(&MISSING),
        other => other,
    };
    let groups = decode_array(groups_value, "groups", 0)
        .iter()
        .filter_map(decode_group)
        .collect();
    repair_groups(groups)
}

/// Decode a whole stored template, metadata included.
pub fn load_template(raw: &Value) -> LoadedTemplate {
    let id = raw.get("id").and_then(|v| match v {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    });
    LoadedTemplate {
        id,
        name: raw.get("name").map(scalar_text).unwrap_or_default(),
        description: raw.get("description").map(scalar_text).unwrap_or_default(),
        tree: FilterTree::from_groups(from_persisted(raw)),
    }
}

/// Backfill ids, dedupe ids, re-sync field/key, and re-shape values so
/// every invariant holds.
pub(crate) fn repair_groups(groups: Vec<FilterGroup>) -> Vec<FilterGroup> {
    let mut group_ids = HashSet::new();
    groups
        .into_iter()
        .map(|mut group| {
            ensure_unique_id(&mut group.id, &mut group_ids, "group");
            let mut block_ids = HashSet::new();
            for block in &mut group.blocks {
                ensure_unique_id(&mut block.id, &mut block_ids, "block");
                repair_block(block);
            }
            group
        })
        .collect()
}

fn ensure_unique_id(id: &mut String, seen: &mut HashSet<String>, kind: &'static str) {
    if id.is_empty() || seen.contains(id.as_str()) {
        let fresh = new_id();
        debug!(kind, old_id = %id, new_id = %fresh, "Backfilling id");
        *id = fresh;
    }
    seen.insert(id.clone());
}

fn repair_block(block: &mut FilterBlock) {
    sync_block(block);
    if !block.condition_type.is_valid_for(block.filter_type) {
        block.condition_type = ConditionType::Equal;
    }
    let value = std::mem::take(&mut block.value);
    block.value = normalize_on_input(value, block.condition_type);
}

/// Coerce a JSON value into an array, unwrapping string-encoded JSON.
fn decode_array(value: &Value, what: &'static str, depth: usize) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        Value::String(encoded) if depth < MAX_ENCODING_DEPTH => {
            match serde_json::from_str::<Value>(encoded) {
                Ok(decoded) => decode_array(&decoded, what, depth + 1),
                Err(e) => {
                    warn!(what, error = %e, "Could not decode string-encoded payload, using empty list");
                    Vec::new()
                }
            }
        }
        Value::Null => Vec::new(),
        other => {
            debug!(what, kind = json_kind(other), "Coercing non-array payload to empty list");
            Vec::new()
        }
    }
}

fn decode_group(value: &Value) -> Option<FilterGroup> {
    let map = value.as_object()?;
    let operator = map
        .get("operator")
        .and_then(parse_tag::<LogicalOperator>)
        .unwrap_or_default();
    let blocks = map
        .get("blocks")
        .map(|b| decode_array(b, "blocks", 0))
        .unwrap_or_default()
        .iter()
        .filter_map(|b| decode_block(b, operator))
        .collect();

    Some(FilterGroup {
        id: map.get("id").map(scalar_text).unwrap_or_default(),
        blocks,
        operator,
    })
}

fn decode_block(value: &Value, group_operator: LogicalOperator) -> Option<FilterBlock> {
    let map = value.as_object()?;
    Some(FilterBlock {
        id: map.get("id").map(scalar_text).unwrap_or_default(),
        filter_type: map
            .get("type")
            .and_then(parse_tag::<FilterType>)
            .unwrap_or(FilterType::Device),
        condition_type: map
            .get("conditionType")
            .and_then(parse_tag::<ConditionType>)
            .unwrap_or(ConditionType::Equal),
        field: map.get("field").map(scalar_text).unwrap_or_default(),
        key: map.get("key").map(scalar_text).unwrap_or_default(),
        value: map.get("value").map(decode_value).unwrap_or_default(),
        operator: map
            .get("operator")
            .and_then(parse_tag::<LogicalOperator>)
            .unwrap_or(group_operator),
        is_active: map.get("isActive").and_then(Value::as_bool).unwrap_or(true),
    })
}

fn decode_value(value: &Value) -> FilterValue {
    match value {
        Value::Array(items) => FilterValue::List(
            items
                .iter()
                .filter(|v| !v.is_null())
                .map(scalar_text)
                .collect(),
        ),
        other => FilterValue::Single(scalar_text(other)),
    }
}

fn parse_tag<T: std::str::FromStr>(value: &Value) -> Option<T> {
    value.as_str().and_then(|s| s.parse().ok())
}

/// Text of a scalar; `null` is empty, strings are unquoted.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
