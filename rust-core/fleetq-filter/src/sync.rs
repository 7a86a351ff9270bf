// SPDX-License-Identifier: PMPL-1.0-or-later
//! Field/key synchronization.
//!
//! Blocks carry their identifier twice, as `field` and `key`. Every patch
//! and every loaded block passes through here so the two never diverge.
//! When both are present and disagree, `field` wins.

use crate::{BlockPatch, FilterBlock};

/// Mirror whichever of `field` / `key` is present into the other.
pub fn sync(mut patch: BlockPatch) -> BlockPatch {
    match (&patch.field, &patch.key) {
        (Some(field), None) => patch.key = Some(field.clone()),
        (None, Some(key)) => patch.field = Some(key.clone()),
        (Some(field), Some(key)) if field != key => patch.key = Some(field.clone()),
        _ => {}
    }
    patch
}

/// Repair a block in place. Returns `true` if anything changed.
pub fn sync_block(block: &mut FilterBlock) -> bool {
    if block.field == block.key {
        return false;
    }
    if block.field.is_empty() {
        block.field = block.key.clone();
    } else {
        block.key = block.field.clone();
    }
    true
}
