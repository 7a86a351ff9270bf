// SPDX-License-Identifier: PMPL-1.0-or-later
//! Copy-on-write mutation engine.
//!
//! Every operation takes the current tree by reference and returns a new
//! one; the input is never modified. Unknown group or block ids are a
//! no-op and return an identical tree.
//!
//! Invariants held after every operation:
//! - `block.field == block.key`
//! - a group's operator is written through to all of its blocks
//! - membership conditions hold a token list, all others a single string

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{default_field_for, FilterCatalog};
use crate::normalize::{normalize_on_input, upgraded_condition};
use crate::sync::sync;
use crate::template::repair_groups;
use crate::{
    new_id, BlockPatch, ConditionType, FilterBlock, FilterGroup, FilterType, FilterValue,
    GroupPatch, LogicalOperator,
};

/// Request to prefetch the known values for a block's field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WarmRequest {
    pub filter_type: FilterType,
    pub field: String,
}

impl WarmRequest {
    fn for_field(filter_type: FilterType, field: &str) -> Option<Self> {
        (!field.is_empty()).then(|| Self {
            filter_type,
            field: field.to_string(),
        })
    }
}

/// Result of a block-level edit: the new tree plus an optional value
/// catalog warm-up for the collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockEdit {
    pub tree: FilterTree,
    pub warm: Option<WarmRequest>,
}

impl BlockEdit {
    fn unchanged(tree: &FilterTree) -> Self {
        Self {
            tree: tree.clone(),
            warm: None,
        }
    }
}

/// The editable filter expression: an ordered list of groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterTree {
    groups: Vec<FilterGroup>,
}

impl FilterTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from foreign groups, repairing ids, field/key pairs,
    /// and value shapes on the way in.
    pub fn from_groups(groups: Vec<FilterGroup>) -> Self {
        Self {
            groups: repair_groups(groups),
        }
    }

    pub fn groups(&self) -> &[FilterGroup] {
        &self.groups
    }

    pub fn into_groups(self) -> Vec<FilterGroup> {
        self.groups
    }

    pub fn group(&self, group_id: &str) -> Option<&FilterGroup> {
        self.groups.iter().find(|g| g.id == group_id)
    }

    pub fn block(&self, group_id: &str, block_id: &str) -> Option<&FilterBlock> {
        self.group(group_id).and_then(|g| g.block(block_id))
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn block_count(&self) -> usize {
        self.groups.iter().map(|g| g.blocks.len()).sum()
    }

    /// Whether anything in the tree would be executed.
    pub fn has_active_blocks(&self) -> bool {
        self.groups.iter().any(FilterGroup::has_active_blocks)
    }

    /// Append an empty group joined with `AND`.
    pub fn add_group(&self) -> FilterTree {
        let mut next = self.clone();
        let id = new_id();
        debug!(group_id = %id, "Adding filter group");
        next.groups.push(FilterGroup {
            id,
            blocks: Vec::new(),
            operator: LogicalOperator::And,
        });
        next
    }

    /// Merge `patch` into a group. A new operator is written through to
    /// every block in the group.
    pub fn update_group(&self, group_id: &str, patch: &GroupPatch) -> FilterTree {
        let mut next = self.clone();
        let Some(group) = next.group_mut(group_id) else {
            debug!(group_id, "update_group: unknown group, ignoring");
            return self.clone();
        };

        if let Some(operator) = patch.operator {
            group.operator = operator;
            for block in &mut group.blocks {
                block.operator = operator;
            }
        }
        next
    }

    /// Append a default block of `filter_type` to a group.
    ///
    /// The block starts as `equal` on the first catalog field for its type
    /// (blank if that catalog is still empty) and inherits the group's
    /// operator.
    pub fn add_block(
        &self,
        group_id: &str,
        filter_type: FilterType,
        catalog: &FilterCatalog,
    ) -> BlockEdit {
        let mut next = self.clone();
        let Some(group) = next.group_mut(group_id) else {
            debug!(group_id, "add_block: unknown group, ignoring");
            return BlockEdit::unchanged(self);
        };

        let field = default_field_for(filter_type, catalog);
        let block = FilterBlock {
            id: new_id(),
            filter_type,
            condition_type: ConditionType::Equal,
            key: field.clone(),
            field,
            value: FilterValue::empty(),
            operator: group.operator,
            is_active: true,
        };
        debug!(group_id, block_id = %block.id, field = %block.field, "Adding filter block");

        let warm = WarmRequest::for_field(filter_type, &block.field);
        group.blocks.push(block);
        BlockEdit { tree: next, warm }
    }

    /// Merge `patch` into a block after synchronizing field/key and
    /// normalizing the value.
    ///
    /// - a condition not valid for the block's filter type is ignored
    /// - changing the filter type resets an invalid condition to `equal`
    /// - assigning several values to a single-valued condition upgrades it
    ///   to `in`
    /// - changing the condition re-shapes the existing value
    /// - a new field (or filter type) requests a value catalog warm-up
    pub fn update_block(&self, group_id: &str, block_id: &str, patch: BlockPatch) -> BlockEdit {
        let mut next = self.clone();
        let Some(block) = next.block_mut(group_id, block_id) else {
            debug!(group_id, block_id, "update_block: unknown block, ignoring");
            return BlockEdit::unchanged(self);
        };

        let patch = sync(patch);
        let mut refetch = false;

        if let Some(filter_type) = patch.filter_type {
            if filter_type != block.filter_type {
                block.filter_type = filter_type;
                refetch = true;
                if !block.condition_type.is_valid_for(filter_type) {
                    block.condition_type = ConditionType::Equal;
                }
            }
        }

        if let Some(condition) = patch.condition_type {
            if condition.is_valid_for(block.filter_type) {
                block.condition_type = condition;
            } else {
                debug!(
                    block_id,
                    condition = %condition,
                    filter_type = %block.filter_type,
                    "Ignoring condition not valid for filter type"
                );
            }
        }

        if let Some(field) = patch.field {
            if field != block.field {
                refetch = true;
            }
            block.key = patch.key.unwrap_or_else(|| field.clone());
            block.field = field;
        }

        let raw = match patch.value {
            Some(value) => {
                block.condition_type = upgraded_condition(&value, block.condition_type);
                value
            }
            None => std::mem::take(&mut block.value),
        };
        block.value = normalize_on_input(raw, block.condition_type);

        if let Some(is_active) = patch.is_active {
            block.is_active = is_active;
        }

        let warm = if refetch {
            WarmRequest::for_field(block.filter_type, &block.field)
        } else {
            None
        };
        BlockEdit { tree: next, warm }
    }

    pub fn remove_block(&self, group_id: &str, block_id: &str) -> FilterTree {
        let mut next = self.clone();
        if let Some(group) = next.group_mut(group_id) {
            group.blocks.retain(|b| b.id != block_id);
        }
        next
    }

    pub fn remove_all_blocks_in_group(&self, group_id: &str) -> FilterTree {
        let mut next = self.clone();
        if let Some(group) = next.group_mut(group_id) {
            group.blocks.clear();
        }
        next
    }

    pub fn remove_group(&self, group_id: &str) -> FilterTree {
        let mut next = self.clone();
        next.groups.retain(|g| g.id != group_id);
        next
    }

    /// Empty the whole tree.
    pub fn reset_all(&self) -> FilterTree {
        FilterTree::new()
    }

    /// Give blank-field blocks the first field of their (now loaded)
    /// catalog. Blocks whose catalog is still empty stay blank.
    pub fn fill_default_fields(&self, catalog: &FilterCatalog) -> (FilterTree, Vec<WarmRequest>) {
        let mut next = self.clone();
        let mut warm = Vec::new();
        for block in next.groups.iter_mut().flat_map(|g| g.blocks.iter_mut()) {
            if !block.field.is_empty() {
                continue;
            }
            let field = default_field_for(block.filter_type, catalog);
            if let Some(request) = WarmRequest::for_field(block.filter_type, &field) {
                warm.push(request);
                block.key = field.clone();
                block.field = field;
            }
        }
        (next, warm)
    }

    fn group_mut(&mut self, group_id: &str) -> Option<&mut FilterGroup> {
        self.groups.iter_mut().find(|g| g.id == group_id)
    }

    fn block_mut(&mut self, group_id: &str, block_id: &str) -> Option<&mut FilterBlock> {
        self.group_mut(group_id)
            .and_then(|g| g.blocks.iter_mut().find(|b| b.id == block_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FilterOption;

    fn catalog() -> FilterCatalog {
        FilterCatalog::new()
            .with_options(
                FilterType::Device,
                vec![FilterOption::new("IP", "ip"), FilterOption::plain("hostname")],
            )
            .with_options(FilterType::NodeLabel, vec![FilterOption::plain("zone")])
    }

    /// One group holding one device block; returns (tree, group id, block id).
    fn single_block_tree() -> (FilterTree, String, String) {
        let tree = FilterTree::new().add_group();
        let gid = tree.groups()[0].id.clone();
        let edit = tree.add_block(&gid, FilterType::Device, &catalog());
        let bid = edit.tree.groups()[0].blocks[0].id.clone();
        (edit.tree, gid, bid)
    }

    #[test]
    fn test_add_group_defaults() {
        let tree = FilterTree::new().add_group();
        assert_eq!(tree.groups().len(), 1);
        assert!(tree.groups()[0].blocks.is_empty());
        assert_eq!(tree.groups()[0].operator, LogicalOperator::And);
    }

    #[test]
    fn test_add_block_defaults() {
        let tree = FilterTree::new().add_group();
        let gid = tree.groups()[0].id.clone();
        let tree = tree.update_group(&gid, &GroupPatch::operator(LogicalOperator::Or));
        let edit = tree.add_block(&gid, FilterType::Device, &catalog());

        let block = &edit.tree.groups()[0].blocks[0];
        assert_eq!(block.condition_type, ConditionType::Equal);
        assert_eq!(block.field, "ip");
        assert_eq!(block.key, "ip");
        assert_eq!(block.operator, LogicalOperator::Or);
        assert!(block.is_active);
        assert_eq!(
            edit.warm,
            Some(WarmRequest {
                filter_type: FilterType::Device,
                field: "ip".to_string()
            })
        );
    }

    #[test]
    fn test_add_block_with_unloaded_catalog() {
        let tree = FilterTree::new().add_group();
        let gid = tree.groups()[0].id.clone();
        let edit = tree.add_block(&gid, FilterType::Taint, &catalog());
        let block = &edit.tree.groups()[0].blocks[0];
        assert!(block.field.is_empty());
        assert!(block.key.is_empty());
        assert!(edit.warm.is_none());
    }

    #[test]
    fn test_input_tree_is_not_modified() {
        let (tree, gid, bid) = single_block_tree();
        let before = tree.clone();
        let _ = tree.update_block(&gid, &bid, BlockPatch::value("x"));
        let _ = tree.remove_group(&gid);
        assert_eq!(tree, before);
    }

    #[test]
    fn test_update_group_propagates_operator() {
        let (tree, gid, _) = single_block_tree();
        let tree = tree.add_block(&gid, FilterType::NodeLabel, &catalog()).tree;
        let tree = tree.update_group(&gid, &GroupPatch::operator(LogicalOperator::Or));
        let group = tree.group(&gid).unwrap();
        assert_eq!(group.operator, LogicalOperator::Or);
        assert!(group.blocks.iter().all(|b| b.operator == LogicalOperator::Or));
    }

    #[test]
    fn test_unknown_ids_are_noops() {
        let (tree, gid, bid) = single_block_tree();
        assert_eq!(tree.update_group("nope", &GroupPatch::operator(LogicalOperator::Or)), tree);
        assert_eq!(tree.add_block("nope", FilterType::Device, &catalog()).tree, tree);
        assert_eq!(tree.update_block(&gid, "nope", BlockPatch::value("x")).tree, tree);
        assert_eq!(tree.update_block("nope", &bid, BlockPatch::value("x")).tree, tree);
        assert_eq!(tree.remove_block(&gid, "nope"), tree);
        assert_eq!(tree.remove_all_blocks_in_group("nope"), tree);
        assert_eq!(tree.remove_group("nope"), tree);
    }

    #[test]
    fn test_multi_value_assignment_upgrades_to_in() {
        let (tree, gid, bid) = single_block_tree();
        let edit = tree.update_block(&gid, &bid, BlockPatch::value(vec!["10.0.0.1", "10.0.0.2"]));
        let block = edit.tree.block(&gid, &bid).unwrap();
        assert_eq!(block.condition_type, ConditionType::In);
        assert_eq!(block.value, FilterValue::from(vec!["10.0.0.1", "10.0.0.2"]));
        assert!(edit.warm.is_none());
    }

    #[test]
    fn test_in_block_splits_free_text() {
        let (tree, gid, bid) = single_block_tree();
        let tree = tree
            .update_block(&gid, &bid, BlockPatch::condition(ConditionType::In))
            .tree;
        let tree = tree
            .update_block(&gid, &bid, BlockPatch::value("10.0.0.1, 10.0.0.2;10.0.0.3"))
            .tree;
        assert_eq!(
            tree.block(&gid, &bid).unwrap().value,
            FilterValue::from(vec!["10.0.0.1", "10.0.0.2", "10.0.0.3"])
        );
    }

    #[test]
    fn test_condition_change_reshapes_value() {
        let (tree, gid, bid) = single_block_tree();
        let tree = tree
            .update_block(&gid, &bid, BlockPatch::value(vec!["a", "b"]))
            .tree;
        let tree = tree
            .update_block(&gid, &bid, BlockPatch::condition(ConditionType::NotEqual))
            .tree;
        let block = tree.block(&gid, &bid).unwrap();
        assert_eq!(block.condition_type, ConditionType::NotEqual);
        assert_eq!(block.value, FilterValue::from("a"));
    }

    #[test]
    fn test_invalid_condition_for_type_is_ignored() {
        let tree = FilterTree::new().add_group();
        let gid = tree.groups()[0].id.clone();
        let tree = tree.add_block(&gid, FilterType::NodeLabel, &catalog()).tree;
        let bid = tree.groups()[0].blocks[0].id.clone();

        let tree = tree
            .update_block(&gid, &bid, BlockPatch::condition(ConditionType::GreaterThan))
            .tree;
        assert_eq!(tree.block(&gid, &bid).unwrap().condition_type, ConditionType::Equal);
    }

    #[test]
    fn test_type_change_resets_invalid_condition() {
        let (tree, gid, bid) = single_block_tree();
        let tree = tree
            .update_block(&gid, &bid, BlockPatch::condition(ConditionType::IsEmpty))
            .tree;
        let edit = tree.update_block(
            &gid,
            &bid,
            BlockPatch {
                filter_type: Some(FilterType::Taint),
                field: Some("dedicated".to_string()),
                ..BlockPatch::default()
            },
        );
        let block = edit.tree.block(&gid, &bid).unwrap();
        assert_eq!(block.filter_type, FilterType::Taint);
        assert_eq!(block.condition_type, ConditionType::Equal);
        assert_eq!(edit.warm.unwrap().filter_type, FilterType::Taint);
    }

    #[test]
    fn test_key_only_patch_syncs_field_and_rewarms() {
        let (tree, gid, bid) = single_block_tree();
        let edit = tree.update_block(&gid, &bid, BlockPatch::key("hostname"));
        let block = edit.tree.block(&gid, &bid).unwrap();
        assert_eq!(block.field, "hostname");
        assert_eq!(block.key, "hostname");
        assert_eq!(edit.warm.unwrap().field, "hostname");
    }

    #[test]
    fn test_same_field_does_not_rewarm() {
        let (tree, gid, bid) = single_block_tree();
        let edit = tree.update_block(&gid, &bid, BlockPatch::field("ip"));
        assert!(edit.warm.is_none());
    }

    #[test]
    fn test_deactivate_block() {
        let (tree, gid, bid) = single_block_tree();
        let tree = tree.update_block(&gid, &bid, BlockPatch::active(false)).tree;
        assert!(!tree.block(&gid, &bid).unwrap().is_active);
        assert!(!tree.has_active_blocks());
    }

    #[test]
    fn test_structural_removals() {
        let (tree, gid, bid) = single_block_tree();
        let tree = tree.add_block(&gid, FilterType::Device, &catalog()).tree;
        assert_eq!(tree.block_count(), 2);

        let removed = tree.remove_block(&gid, &bid);
        assert_eq!(removed.block_count(), 1);
        assert!(removed.block(&gid, &bid).is_none());

        let cleared = tree.remove_all_blocks_in_group(&gid);
        assert_eq!(cleared.groups().len(), 1);
        assert_eq!(cleared.block_count(), 0);

        let gone = tree.remove_group(&gid);
        assert!(gone.is_empty());

        assert!(tree.reset_all().is_empty());
    }

    #[test]
    fn test_fill_default_fields_after_catalog_load() {
        let tree = FilterTree::new().add_group();
        let gid = tree.groups()[0].id.clone();
        let tree = tree.add_block(&gid, FilterType::Taint, &catalog()).tree;

        let loaded = catalog().with_options(FilterType::Taint, vec![FilterOption::plain("gpu")]);
        let (tree, warm) = tree.fill_default_fields(&loaded);
        let block = &tree.groups()[0].blocks[0];
        assert_eq!(block.field, "gpu");
        assert_eq!(block.key, "gpu");
        assert_eq!(warm.len(), 1);
    }
}
