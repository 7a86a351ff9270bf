// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>
//!
//! Tab-completion for the fleetq shell.
//!
//! The first word completes against commands and meta-commands. Later words
//! complete against whatever the command expects in that slot: filter
//! types, condition tags, operators, or `set` attribute names.

use fleetq_filter::{ConditionType, FilterType};
use rustyline::completion::{Completer, Pair};
use rustyline::Context;

use crate::command::COMMANDS;

/// Meta-commands starting with backslash.
const META_COMMANDS: &[&str] = &["\\format", "\\timing", "\\status", "\\help", "\\quit", "\\q"];

const SET_ATTRIBUTES: &[&str] = &["field", "cond", "value", "type"];

const OPERATORS: &[&str] = &["and", "or"];

const FORMATS: &[&str] = &["table", "json", "csv"];

pub struct FleetqCompleter;

impl FleetqCompleter {
    /// Words valid at the cursor, given the words already typed before it.
    fn vocabulary(previous: &[&str]) -> Vec<String> {
        let owned = |words: &[&str]| words.iter().map(|w| w.to_string()).collect();
        match previous {
            [] => {
                let mut all: Vec<String> = owned(COMMANDS);
                all.extend(owned(META_COMMANDS));
                all
            }
            ["block", _] | ["set", _, "type"] => {
                FilterType::ALL.iter().map(|t| t.as_str().to_string()).collect()
            }
            ["set", _, "cond" | "condition"] => {
                ConditionType::ALL.iter().map(|c| c.as_str().to_string()).collect()
            }
            ["set", _] => owned(SET_ATTRIBUTES),
            ["op", _] => owned(OPERATORS),
            ["\\format"] => owned(FORMATS),
            _ => Vec::new(),
        }
    }
}

impl Completer for FleetqCompleter {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, prefix) = find_word_start(line, pos);
        let previous: Vec<&str> = line[..start].split_whitespace().collect();
        let lower = prefix.to_lowercase();

        let candidates = Self::vocabulary(&previous)
            .into_iter()
            .filter(|word| word.to_lowercase().starts_with(&lower))
            .map(|word| Pair {
                display: word.clone(),
                replacement: word,
            })
            .collect();

        Ok((start, candidates))
    }
}

/// Start of the word under the cursor, and the partial word itself.
fn find_word_start(line: &str, pos: usize) -> (usize, &str) {
    let before = &line[..pos];
    let start = before
        .rfind(char::is_whitespace)
        .map(|i| i + 1)
        .unwrap_or(0);
    (start, &line[start..pos])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete(line: &str) -> Vec<String> {
        let (start, prefix) = find_word_start(line, line.len());
        let previous: Vec<&str> = line[..start].split_whitespace().collect();
        FleetqCompleter::vocabulary(&previous)
            .into_iter()
            .filter(|w| w.to_lowercase().starts_with(&prefix.to_lowercase()))
            .collect()
    }

    #[test]
    fn test_find_word_start() {
        assert_eq!(find_word_start("set 1.1 co", 10), (8, "co"));
        assert_eq!(find_word_start("run", 3), (0, "run"));
        assert_eq!(find_word_start("", 0), (0, ""));
    }

    #[test]
    fn test_command_words() {
        assert_eq!(complete("re"), vec!["reset".to_string()]);
        assert!(complete("\\q").contains(&"\\quit".to_string()));
    }

    #[test]
    fn test_condition_tags_after_cond() {
        let found = complete("set 1.2 cond not");
        assert!(found.contains(&"notEqual".to_string()));
        assert!(found.contains(&"notIn".to_string()));
        assert!(!found.contains(&"equal".to_string()));
    }

    #[test]
    fn test_filter_types_after_block() {
        assert_eq!(complete("block 1 t"), vec!["taint".to_string()]);
    }

    #[test]
    fn test_no_completion_for_free_text() {
        assert!(complete("set 1.1 value 10.").is_empty());
    }
}
