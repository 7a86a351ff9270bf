// SPDX-License-Identifier: PMPL-1.0-or-later
//! Value normalization between raw input and each condition's canonical
//! representation.
//!
//! - `in` / `notIn`: a list of trimmed, non-empty tokens. Free text and list
//!   entries are split on newlines, commas, semicolons, and whitespace.
//!   Order of first appearance is kept; duplicates are kept.
//! - everything else: a single string. A list keeps only its first entry.
//!
//! On the wire every value is one string; lists are comma-joined.

use std::sync::OnceLock;

use regex::Regex;

use crate::{ConditionType, FilterValue};

static SEPARATORS: OnceLock<Regex> = OnceLock::new();

fn separators() -> &'static Regex {
    SEPARATORS.get_or_init(|| Regex::new(r"[\n,;\s]+").expect("separator pattern is valid"))
}

/// Split free text into membership tokens.
pub fn split_tokens(raw: &str) -> impl Iterator<Item = &str> {
    separators()
        .split(raw)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Convert raw input into the canonical value for `condition`.
pub fn normalize_on_input(raw: FilterValue, condition: ConditionType) -> FilterValue {
    if condition.is_multi_value() {
        let tokens = match &raw {
            FilterValue::Single(text) => split_tokens(text).map(str::to_string).collect(),
            FilterValue::List(items) => items
                .iter()
                .flat_map(|item| split_tokens(item))
                .map(str::to_string)
                .collect(),
        };
        return FilterValue::List(tokens);
    }

    match raw {
        FilterValue::Single(text) => FilterValue::Single(text),
        FilterValue::List(items) => {
            FilterValue::Single(items.into_iter().next().unwrap_or_default())
        }
    }
}

/// Flatten a value into the single string the remote side expects.
///
/// Valueless conditions are not special-cased: whatever value is present
/// is sent unchanged.
pub fn normalize_for_transport(value: &FilterValue, condition: ConditionType) -> String {
    match value {
        FilterValue::List(items) if condition.is_multi_value() => items
            .iter()
            .flat_map(|item| split_tokens(item))
            .collect::<Vec<_>>()
            .join(","),
        FilterValue::List(items) => items.join(","),
        FilterValue::Single(text) => text.clone(),
    }
}

/// Condition a block should carry after `value` is assigned to it.
///
/// Assigning more than one value to a single-valued condition upgrades it
/// to `in`.
pub fn upgraded_condition(value: &FilterValue, current: ConditionType) -> ConditionType {
    match value {
        FilterValue::List(items) if items.len() > 1 && !current.is_multi_value() => {
            ConditionType::In
        }
        _ => current,
    }
}
