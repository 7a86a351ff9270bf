// SPDX-License-Identifier: PMPL-1.0-or-later
//! Shell command grammar.
//!
//! Groups and blocks are addressed by 1-based position as shown by `show`:
//! `2` is the second group, `2.1` the first block in it.

use std::str::FromStr;

use fleetq_filter::{ConditionType, FilterType, LogicalOperator};

/// `group` or `group.block`, both 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Group(usize),
    Block(usize, usize),
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let position = |part: &str| -> Result<usize, String> {
            match part.parse::<usize>() {
                Ok(n) if n > 0 => Ok(n),
                _ => Err(format!("'{s}' is not a position like 2 or 2.1")),
            }
        };
        match s.split_once('.') {
            Some((group, block)) => Ok(Target::Block(position(group)?, position(block)?)),
            None => Ok(Target::Group(position(s)?)),
        }
    }
}

/// One attribute assignment for `set`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attr {
    Field(String),
    Condition(ConditionType),
    Value(String),
    Type(FilterType),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Show,
    AddGroup,
    AddBlock { group: usize, filter_type: FilterType },
    SetOperator { group: usize, operator: LogicalOperator },
    Set { group: usize, block: usize, attr: Attr },
    Activate { group: usize, block: usize, active: bool },
    Remove(Target),
    Clear(usize),
    Reset,
    Catalog,
    Values { group: usize, block: usize },
    Run { page: u32 },
    Save { name: String, description: String },
    Templates { page: u32 },
    Load(u64),
    Delete(u64),
}

/// Command words, for completion.
pub const COMMANDS: &[&str] = &[
    "show", "group", "block", "op", "set", "on", "off", "rm", "clear", "reset", "catalog",
    "values", "run", "save", "templates", "load", "delete",
];

fn block_target(arg: Option<&str>, usage: &str) -> Result<(usize, usize), String> {
    match arg.map(str::parse::<Target>).transpose()? {
        Some(Target::Block(g, b)) => Ok((g, b)),
        _ => Err(format!("Usage: {usage}")),
    }
}

fn group_target(arg: Option<&str>, usage: &str) -> Result<usize, String> {
    match arg.map(str::parse::<Target>).transpose()? {
        Some(Target::Group(g)) => Ok(g),
        _ => Err(format!("Usage: {usage}")),
    }
}

fn page_arg(arg: Option<&str>) -> Result<u32, String> {
    match arg {
        None => Ok(1),
        Some(raw) => raw
            .parse::<u32>()
            .ok()
            .filter(|p| *p > 0)
            .ok_or_else(|| format!("'{raw}' is not a page number")),
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let mut args = rest.split_whitespace();

        match word.to_lowercase().as_str() {
            "show" | "ls" => Ok(Command::Show),
            "group" => Ok(Command::AddGroup),
            "block" => {
                let group = group_target(args.next(), "block <group> [device|label|taint]")?;
                let filter_type = match args.next() {
                    Some(t) => t.parse::<FilterType>().map_err(|e| e.to_string())?,
                    None => FilterType::Device,
                };
                Ok(Command::AddBlock { group, filter_type })
            }
            "op" => {
                let group = group_target(args.next(), "op <group> <and|or>")?;
                let operator = args
                    .next()
                    .ok_or("Usage: op <group> <and|or>")?
                    .parse::<LogicalOperator>()
                    .map_err(|e| e.to_string())?;
                Ok(Command::SetOperator { group, operator })
            }
            "set" => {
                let usage = "set <group.block> <field|cond|value|type> <text>";
                let (group, block) = block_target(args.next(), usage)?;
                let attr_name = args.next().ok_or_else(|| format!("Usage: {usage}"))?;
                // Values may contain spaces; take the remainder verbatim.
                let text = rest
                    .splitn(3, char::is_whitespace)
                    .nth(2)
                    .map(str::trim)
                    .unwrap_or_default();
                let attr = match attr_name.to_lowercase().as_str() {
                    "field" | "key" if !text.is_empty() => Attr::Field(text.to_string()),
                    "cond" | "condition" => {
                        Attr::Condition(text.parse::<ConditionType>().map_err(|e| e.to_string())?)
                    }
                    "value" => Attr::Value(text.to_string()),
                    "type" => Attr::Type(text.parse::<FilterType>().map_err(|e| e.to_string())?),
                    _ => return Err(format!("Usage: {usage}")),
                };
                Ok(Command::Set { group, block, attr })
            }
            "on" | "off" => {
                let (group, block) = block_target(args.next(), "on|off <group.block>")?;
                Ok(Command::Activate {
                    group,
                    block,
                    active: word.eq_ignore_ascii_case("on"),
                })
            }
            "rm" => {
                let target = args
                    .next()
                    .ok_or("Usage: rm <group> | rm <group.block>")?
                    .parse::<Target>()?;
                Ok(Command::Remove(target))
            }
            "clear" => Ok(Command::Clear(group_target(args.next(), "clear <group>")?)),
            "reset" => Ok(Command::Reset),
            "catalog" => Ok(Command::Catalog),
            "values" => {
                let (group, block) = block_target(args.next(), "values <group.block>")?;
                Ok(Command::Values { group, block })
            }
            "run" => Ok(Command::Run {
                page: page_arg(args.next())?,
            }),
            "save" => {
                let (name, description) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                if name.is_empty() {
                    return Err("Usage: save <name> [description]".to_string());
                }
                Ok(Command::Save {
                    name: name.to_string(),
                    description: description.trim().to_string(),
                })
            }
            "templates" => Ok(Command::Templates {
                page: page_arg(args.next())?,
            }),
            "load" | "delete" => {
                let id = args
                    .next()
                    .and_then(|raw| raw.parse::<u64>().ok())
                    .ok_or_else(|| format!("Usage: {word} <template id>"))?;
                Ok(if word.eq_ignore_ascii_case("load") {
                    Command::Load(id)
                } else {
                    Command::Delete(id)
                })
            }
            other => Err(format!("Unknown command: {other}. Type \\help for available commands.")),
        }
    }
}
