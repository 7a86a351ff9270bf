// SPDX-License-Identifier: PMPL-1.0-or-later
//! Human-readable query summaries.
//!
//! A block renders as `<field><symbol><value>`, a group as its blocks
//! joined by the group operator inside parentheses, and consecutive groups
//! are joined by the operator of the group on the left. Inactive blocks
//! and groups with nothing to render are skipped. The result is cut to
//! `max_length` characters, ending in `...` when truncated.

use crate::catalog::FilterCatalog;
use crate::{ConditionType, FilterBlock, FilterGroup, FilterValue};

/// How many list entries are shown before the ellipsis.
const LIST_PREVIEW: usize = 2;
const ELLIPSIS: &str = "...";

/// Summarize groups using raw field names.
pub fn summarize(groups: &[FilterGroup], max_length: usize) -> String {
    render(groups, None, max_length)
}

/// Summarize groups, preferring catalog labels for field names.
pub fn summarize_with_labels(groups: &[FilterGroup], catalog: &FilterCatalog, max_length: usize) -> String {
    render(groups, Some(catalog), max_length)
}

fn render(groups: &[FilterGroup], catalog: Option<&FilterCatalog>, max_length: usize) -> String {
    let mut out = String::new();
    let mut pending_join = None;

    for group in groups {
        let rendered: Vec<String> = group
            .blocks
            .iter()
            .filter(|b| b.is_active)
            .map(|b| render_block(b, catalog))
            .collect();
        if rendered.is_empty() {
            continue;
        }

        if let Some(operator) = pending_join {
            out.push_str(&format!(" {operator} "));
        }
        out.push('(');
        out.push_str(&rendered.join(&format!(" {} ", group.operator)));
        out.push(')');
        pending_join = Some(group.operator);
    }

    truncate(out, max_length)
}

fn render_block(block: &FilterBlock, catalog: Option<&FilterCatalog>) -> String {
    let field = catalog
        .and_then(|c| c.label_for(block.filter_type, &block.field))
        .unwrap_or(block.field.as_str());
    let symbol = block.condition_type.symbol();

    match block.condition_type {
        ConditionType::Exists | ConditionType::NotExists => format!("{field}{symbol}"),
        _ => format!("{field}{symbol}{}", render_value(&block.value)),
    }
}

fn render_value(value: &FilterValue) -> String {
    match value {
        FilterValue::Single(text) => text.clone(),
        FilterValue::List(items) => {
            let mut shown: Vec<&str> = items.iter().take(LIST_PREVIEW).map(String::as_str).collect();
            if items.len() > LIST_PREVIEW {
                shown.push(ELLIPSIS);
            }
            format!("[{}]", shown.join(", "))
        }
    }
}

/// Cut to `max_length` characters. Token boundaries are not respected.
/// Bounds shorter than the ellipsis get a clipped ellipsis.
fn truncate(text: String, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        return text;
    }
    if max_length < ELLIPSIS.len() {
        return ELLIPSIS[..max_length].to_string();
    }
    let keep = max_length.saturating_sub(ELLIPSIS.len());
    let mut cut: String = text.chars().take(keep).collect();
    cut.push_str(ELLIPSIS);
    cut
}
