// SPDX-License-Identifier: PMPL-1.0-or-later
// Fuzz target for loading stored templates from arbitrary JSON

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };

    // Loading never fails; whatever survives must satisfy field == key.
    let loaded = fleetq_filter::load_template(&raw);
    for block in loaded.tree.groups().iter().flat_map(|g| &g.blocks) {
        assert_eq!(block.field, block.key);
        assert!(block.condition_type.is_valid_for(block.filter_type));
    }

    let _ = fleetq_filter::from_persisted(&raw);
});
