// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>
//!
//! Output formatters for the fleetq shell.
//!
//! Device pages and template listings render as a table, pretty JSON, or
//! CSV. The filter tree itself is always shown as a table.

use std::fmt;

use comfy_table::{Cell, ContentArrangement, Table};
use fleetq_filter::{Device, FilterCatalog, FilterTree, Page, TemplateSummary};
use serde_json::{Map, Value};

/// Available output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Table => "table",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        })
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(format!("Unknown format '{other}'. Valid formats: table, json, csv")),
        }
    }
}

/// Render one page of matching devices.
///
/// Columns are the union of attribute names in first-seen order.
pub fn format_devices(page: &Page<Device>, format: OutputFormat) -> String {
    let rows: Vec<&Map<String, Value>> = page.list.iter().map(|d| &d.0).collect();
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(page).unwrap_or_default(),
        OutputFormat::Csv => rows_csv(&rows),
        OutputFormat::Table => {
            let mut out = format!(
                "{}\n(page {}, {} of {} device{}",
                rows_table(&rows),
                page.page,
                page.list.len(),
                page.total,
                if page.total == 1 { "" } else { "s" }
            );
            if page.has_more() {
                out.push_str(", more with `run <page>`");
            }
            out.push(')');
            out
        }
    }
}

/// Render one page of saved templates.
pub fn format_templates(page: &Page<TemplateSummary>, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(page).unwrap_or_default(),
        OutputFormat::Csv => {
            let mut out = String::from("id,name,description\n");
            for t in &page.list {
                out.push_str(&format!(
                    "{},{},{}\n",
                    t.id,
                    csv_escape(&t.name),
                    csv_escape(&t.description)
                ));
            }
            out
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["id", "name", "description"]);
            for t in &page.list {
                table.add_row(vec![Cell::new(t.id), Cell::new(&t.name), Cell::new(&t.description)]);
            }
            format!(
                "{table}\n(page {}, {} template{} total)",
                page.page,
                page.total,
                if page.total == 1 { "" } else { "s" }
            )
        }
    }
}

/// Render the filter tree with 1-based positions for addressing.
pub fn format_tree(tree: &FilterTree, catalog: &FilterCatalog) -> String {
    if tree.is_empty() {
        return "(no groups; add one with `group`)".to_string();
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "op", "type", "field", "condition", "value", "active"]);

    for (gi, group) in tree.groups().iter().enumerate() {
        table.add_row(vec![
            Cell::new(gi + 1),
            Cell::new(group.operator),
            Cell::new(""),
            Cell::new(format!("({} block{})", group.blocks.len(), if group.blocks.len() == 1 { "" } else { "s" })),
            Cell::new(""),
            Cell::new(""),
            Cell::new(""),
        ]);
        for (bi, block) in group.blocks.iter().enumerate() {
            let field = match catalog.label_for(block.filter_type, &block.field) {
                Some(label) if label != block.field => format!("{} ({label})", block.field),
                _ => block.field.clone(),
            };
            let value = if block.condition_type.is_valueless() {
                String::new()
            } else {
                block.value.entries().join(", ")
            };
            table.add_row(vec![
                Cell::new(format!("{}.{}", gi + 1, bi + 1)),
                Cell::new(block.operator),
                Cell::new(block.filter_type),
                Cell::new(field),
                Cell::new(block.condition_type),
                Cell::new(value),
                Cell::new(if block.is_active { "yes" } else { "no" }),
            ]);
        }
    }

    table.to_string()
}

fn columns(rows: &[&Map<String, Value>]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

fn rows_table(rows: &[&Map<String, Value>]) -> String {
    let columns = columns(rows);
    if columns.is_empty() {
        return "(no devices)".to_string();
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(columns.iter().map(Cell::new));
    for row in rows {
        table.add_row(
            columns
                .iter()
                .map(|col| Cell::new(cell_text(row.get(col).unwrap_or(&Value::Null)))),
        );
    }
    table.to_string()
}

fn rows_csv(rows: &[&Map<String, Value>]) -> String {
    let columns = columns(rows);
    let mut out = columns.iter().map(|c| csv_escape(c)).collect::<Vec<_>>().join(",");
    out.push('\n');
    for row in rows {
        let line: Vec<String> = columns
            .iter()
            .map(|col| csv_escape(&cell_text(row.get(col).unwrap_or(&Value::Null))))
            .collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

/// Short text for a table cell. Long arrays and objects are collapsed.
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) if items.len() > 3 => format!("[{} items]", items.len()),
        Value::Object(map) if map.len() > 3 => format!("{{{} fields}}", map.len()),
        other => other.to_string(),
    }
}

/// Quote a CSV field when it contains a separator, quote, or newline.
fn csv_escape(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetq_filter::{BlockPatch, FilterType};
    use serde_json::json;

    fn device(value: Value) -> Device {
        serde_json::from_value(value).unwrap()
    }

    fn page_of(list: Vec<Device>, total: u64) -> Page<Device> {
        Page {
            list,
            total,
            page: 1,
            size: 20,
        }
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("yaml".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Csv.to_string(), "csv");
    }

    #[test]
    fn test_csv_uses_union_of_columns() {
        let page = page_of(
            vec![
                device(json!({"ip": "10.0.0.1"})),
                device(json!({"ip": "10.0.0.2", "hostname": "edge, west"})),
            ],
            2,
        );
        let csv = format_devices(&page, OutputFormat::Csv);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "ip,hostname");
        assert_eq!(lines[1], "10.0.0.1,");
        assert_eq!(lines[2], "10.0.0.2,\"edge, west\"");
    }

    #[test]
    fn test_table_footer_mentions_more_pages() {
        let page = page_of(vec![device(json!({"ip": "a"}))], 45);
        let out = format_devices(&page, OutputFormat::Table);
        assert!(out.contains("(page 1, 1 of 45 devices"));
        assert!(out.contains("run <page>"));

        let single = page_of(vec![device(json!({"ip": "a"}))], 1);
        assert!(!format_devices(&single, OutputFormat::Table).contains("run <page>"));
    }

    #[test]
    fn test_tree_shows_positions_and_labels() {
        let tree = FilterTree::new().add_group();
        let gid = tree.groups()[0].id.clone();
        let tree = tree.add_block(&gid, FilterType::Device, &FilterCatalog::new()).tree;
        let bid = tree.groups()[0].blocks[0].id.clone();
        let tree = tree.update_block(&gid, &bid, BlockPatch::field("ip")).tree;

        let catalog = FilterCatalog::new().with_options(
            FilterType::Device,
            vec![fleetq_filter::FilterOption::new("IP address", "ip")],
        );
        let out = format_tree(&tree, &catalog);
        assert!(out.contains("1.1"));
        assert!(out.contains("ip (IP address)"));
    }

    #[test]
    fn test_empty_tree_hint() {
        assert!(format_tree(&FilterTree::new(), &FilterCatalog::new()).contains("group"));
    }
}
