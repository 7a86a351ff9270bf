// SPDX-License-Identifier: PMPL-1.0-or-later
// Fuzz target for value normalization of free-text input

#![no_main]

use fleetq_filter::{normalize_for_transport, normalize_on_input, ConditionType, FilterValue};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let Ok(text) = std::str::from_utf8(rest) else {
        return;
    };
    let condition = ConditionType::ALL[selector as usize % ConditionType::ALL.len()];

    let once = normalize_on_input(FilterValue::from(text), condition);
    assert_eq!(once.is_list(), condition.is_multi_value());
    let twice = normalize_on_input(once.clone(), condition);
    assert_eq!(once, twice);

    let _ = normalize_for_transport(&once, condition);
});
